use crate::infra::{FixtureCatalog, FixtureDashboard};
use chrono::Local;
use clap::Args;
use omnicore::adapters::HttpServiceClient;
use omnicore::audit::{
    compute_pricing, write_csv, AuditReport, AuditSession, Pricing, ReviewId, ReviewRecord,
    SearchQuery, SelectionTracker,
};
use omnicore::checkout::{CheckoutFlow, CheckoutOutcome, CustomerDetails, PaymentMethod};
use omnicore::config::AppConfig;
use omnicore::error::AppError;
use omnicore::portal::{
    AppRoute, DashboardStore, DashboardView, InMemorySessionProvider, Navigation, Portal,
    PortalClient, Session, SessionProvider,
};
use omnicore::service::AuditService;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AuditArgs {
    /// Business name to search for
    #[arg(long)]
    pub(crate) name: String,
    /// Optional address to narrow the search
    #[arg(long, default_value = "")]
    pub(crate) address: String,
    /// Review id to select for removal; repeat for several
    #[arg(long)]
    pub(crate) select: Vec<String>,
    /// Write the audit as CSV to this path
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct DashboardArgs {
    /// Identifier of the signed-in customer
    #[arg(long)]
    pub(crate) user_id: String,
    /// Access token issued by the identity provider
    #[arg(long)]
    pub(crate) access_token: String,
    /// Customer email, shown in the header
    #[arg(long)]
    pub(crate) email: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Fixture business to audit
    #[arg(long, default_value = "Cafe Sonne")]
    pub(crate) name: String,
    /// Skip the customer portal part of the demo
    #[arg(long)]
    pub(crate) skip_portal: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            name: "Cafe Sonne".to_string(),
            skip_portal: false,
        }
    }
}

pub(crate) async fn run_audit(args: AuditArgs) -> Result<(), AppError> {
    let AuditArgs {
        name,
        address,
        select,
        csv,
    } = args;

    let config = AppConfig::load()?;
    let client = Arc::new(HttpServiceClient::new(config.upstream)?);
    let service = AuditService::with_client(client);

    let report = service
        .search_and_audit(&SearchQuery::new(name, address))
        .await?;
    let selection = select_reviews(&report.reviews, &select)?;

    render_report(&report, &selection);

    if let Some(path) = csv {
        let file = File::create(&path)?;
        write_csv(BufWriter::new(file), &report.reviews, &selection)?;
        println!("\nCSV written to {}", path.display());
    }
    Ok(())
}

pub(crate) async fn run_dashboard(args: DashboardArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = Arc::new(PortalClient::from_config(
        &config.portal,
        config.upstream.timeout,
    )?);
    let sessions = Arc::new(InMemorySessionProvider::signed_in(Session {
        user_id: args.user_id,
        email: args.email,
        access_token: args.access_token,
    }));

    let portal = Portal::new(sessions, store);
    let view = portal.dashboard().await?;
    render_dashboard(&view);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let catalog = Arc::new(FixtureCatalog::demo());

    println!("Omnicore demo");
    let summary = walk_funnel(&catalog, &args.name).await?;
    println!(
        "\nCheckout for EUR {} redirects to {}",
        summary.pricing.total_display(),
        summary.redirect_url
    );

    if !args.skip_portal {
        let sessions = Arc::new(InMemorySessionProvider::default());
        let walkthrough = walk_portal(sessions, Arc::new(FixtureDashboard)).await?;
        render_dashboard(&walkthrough.view);
    }
    Ok(())
}

pub(crate) struct FunnelSummary {
    pub(crate) pricing: Pricing,
    pub(crate) redirect_url: String,
}

/// Search, audit, select every actionable review and check out.
pub(crate) async fn walk_funnel(
    catalog: &Arc<FixtureCatalog>,
    name: &str,
) -> Result<FunnelSummary, AppError> {
    let service = AuditService::new(catalog.clone(), catalog.clone(), catalog.clone());
    let business = service.search(&SearchQuery::new(name, "")).await?;
    println!("\nBusiness: {} ({})", business.name, business.address);

    let mut session = AuditSession::new(business);
    session.load(service.reviews_adapter().as_ref()).await?;

    let stats = session.stats();
    println!(
        "Score {} / 100, {} critical reviews, confidence {}%",
        stats.score, stats.critical, stats.confidence
    );
    println!("{}", stats.threat_level().label());

    let actionable: Vec<ReviewId> = session
        .reviews()
        .iter()
        .filter(|review| review.is_actionable())
        .map(|review| review.id.clone())
        .collect();
    for id in &actionable {
        session
            .toggle(id)
            .map_err(|err| AppError::Rejected(err.to_string()))?;
    }

    let draft = session
        .start_cleanup()
        .map_err(|guard| AppError::Rejected(guard.to_string()))?;
    println!(
        "Selected {} reviews for removal, total EUR {}",
        draft.selected().len(),
        draft.pricing().total_display()
    );

    let mut flow = CheckoutFlow::new();
    let outcome = flow
        .submit(
            catalog.as_ref(),
            &draft,
            demo_customer(),
            PaymentMethod::Card,
        )
        .await;

    match outcome {
        CheckoutOutcome::Redirect(redirect_url) => Ok(FunnelSummary {
            pricing: draft.pricing(),
            redirect_url,
        }),
        CheckoutOutcome::Failed(err) => Err(err.into()),
    }
}

pub(crate) struct PortalWalkthrough {
    /// Guard decisions for the dashboard: loading, signed out, signed in.
    pub(crate) navigations: Vec<Navigation>,
    pub(crate) view: DashboardView,
}

/// Route guard and dashboard as a customer signs in and out.
pub(crate) async fn walk_portal<S>(
    sessions: Arc<InMemorySessionProvider>,
    store: Arc<S>,
) -> Result<PortalWalkthrough, AppError>
where
    S: DashboardStore + 'static,
{
    let portal = Portal::new(sessions.clone(), store);
    let dashboard = AppRoute::Dashboard.path();
    let mut navigations = Vec::with_capacity(3);

    let navigation = portal.navigate(dashboard);
    println!("\nPortal {dashboard} while loading: {}", describe(&navigation));
    navigations.push(navigation);

    sessions.finish_loading();
    let navigation = portal.navigate(dashboard);
    println!("Portal {dashboard} signed out: {}", describe(&navigation));
    navigations.push(navigation);

    sessions.sign_in(Session {
        user_id: "demo-user".to_string(),
        email: Some("erika@example.test".to_string()),
        access_token: "demo-token".to_string(),
    });
    let navigation = portal.navigate(dashboard);
    println!("Portal {dashboard} signed in: {}", describe(&navigation));
    navigations.push(navigation);
    let view = portal.dashboard().await?;

    portal.sign_out();
    println!(
        "After sign-out the session is {}",
        if sessions.session().session().is_some() {
            "still active"
        } else {
            "cleared"
        }
    );
    Ok(PortalWalkthrough { navigations, view })
}

fn describe(navigation: &Navigation) -> String {
    match navigation {
        Navigation::Render(route) => format!("render {}", route.path()),
        Navigation::Pending => "waiting for session".to_string(),
        Navigation::Redirect(route) => format!("redirect to {}", route.path()),
    }
}

fn select_reviews(reviews: &[ReviewRecord], ids: &[String]) -> Result<SelectionTracker, AppError> {
    let mut selection = SelectionTracker::new();
    for raw in ids {
        let id = ReviewId::new(raw.as_str());
        if selection.contains(&id) {
            continue;
        }
        selection
            .toggle_in(reviews, &id)
            .map_err(|err| AppError::Rejected(err.to_string()))?;
    }
    Ok(selection)
}

fn demo_customer() -> CustomerDetails {
    CustomerDetails {
        first_name: "Erika".to_string(),
        last_name: "Mustermann".to_string(),
        email: "erika@example.test".to_string(),
        address: "Hauptstr. 1".to_string(),
        zip: "10115".to_string(),
        city: "Berlin".to_string(),
    }
}

fn render_report(report: &AuditReport, selection: &SelectionTracker) {
    let stats = &report.stats;
    println!("Audit for {} ({})", report.business.name, report.business.address);
    println!(
        "Generated {}",
        report.generated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    println!(
        "Score {} / 100 | threat {}% | {} critical | confidence {}%",
        stats.score,
        stats.threat_percent(),
        stats.critical,
        stats.confidence
    );
    println!("{}", report.threat_label);

    println!("\nReviews");
    for review in &report.reviews {
        let marker = if selection.contains(&review.id) {
            "[x]"
        } else if review.is_actionable() {
            "[ ]"
        } else {
            "   "
        };
        let flag = match (&review.violation, review.confidence) {
            (Some(violation), Some(confidence)) => {
                format!(" | {} ({}%)", violation, confidence.value())
            }
            (Some(violation), None) => format!(" | {violation}"),
            _ => String::new(),
        };
        println!(
            "  {marker} {} {}★ {}{flag}",
            review.id,
            review.rating.value(),
            review.display_author()
        );
    }

    if !report.rejected.is_empty() {
        println!("\n{} upstream reviews were dropped as malformed", report.rejected.len());
    }

    if !selection.is_empty() {
        let pricing = compute_pricing(&selection.collect(&report.reviews));
        println!(
            "\nSelected {} x EUR {} = EUR {}",
            pricing.count,
            pricing.unit_price,
            pricing.total_display()
        );
    }
}

fn render_dashboard(view: &DashboardView) {
    println!("\nDashboard for {}", view.user_id);
    if view.is_empty() {
        println!("  No audits yet.");
        return;
    }
    for card in &view.entries {
        let steps: Vec<String> = card
            .steps
            .iter()
            .map(|step| {
                if step.active {
                    format!("[{}]", step.label)
                } else {
                    step.label.to_string()
                }
            })
            .collect();
        println!(
            "  {} ({}) #{} {}% {}",
            card.company_name,
            card.address,
            card.short_id,
            card.progress_percent,
            steps.join(" > ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnicore::adapters::{ReviewAdapter, SearchAdapter};
    use omnicore::portal::CleanupStage;

    #[tokio::test]
    async fn funnel_checks_out_every_actionable_review() {
        let catalog = Arc::new(FixtureCatalog::demo());

        let summary = walk_funnel(&catalog, "sonne").await.expect("funnel completes");

        assert_eq!(summary.pricing.count, 3);
        assert_eq!(summary.pricing.total_display(), "59.70");
        assert_eq!(summary.redirect_url, "https://checkout.invalid/session/1");
        let sent = catalog.checkouts();
        assert_eq!(sent.len(), 1);
        let ids: Vec<_> = sent[0].reviews.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r-2", "r-3", "r-4"]);
    }

    #[tokio::test]
    async fn unknown_business_stops_the_funnel() {
        let catalog = Arc::new(FixtureCatalog::demo());
        let err = walk_funnel(&catalog, "Bäckerei Mond")
            .await
            .err()
            .expect("not found");
        assert_eq!(err.user_message(), "Unternehmen nicht gefunden");
    }

    #[tokio::test]
    async fn portal_walkthrough_signs_out_at_the_end() {
        let sessions = Arc::new(InMemorySessionProvider::default());
        let walkthrough = walk_portal(sessions.clone(), Arc::new(FixtureDashboard))
            .await
            .expect("dashboard loads");
        let view = walkthrough.view;

        assert_eq!(view.user_id, "demo-user");
        assert_eq!(view.entries.len(), 3);
        assert_eq!(view.entries[0].stage, CleanupStage::Einreichung);
        assert_eq!(view.entries[2].progress_percent, 100);
        assert!(sessions.session().session().is_none());
    }

    #[tokio::test]
    async fn portal_walkthrough_gates_the_dashboard_on_the_session() {
        let sessions = Arc::new(InMemorySessionProvider::default());
        let walkthrough = walk_portal(sessions, Arc::new(FixtureDashboard))
            .await
            .expect("dashboard loads");

        assert_eq!(
            walkthrough.navigations,
            vec![
                Navigation::Pending,
                Navigation::Redirect(AppRoute::Login),
                Navigation::Render(AppRoute::Dashboard),
            ]
        );
    }

    #[tokio::test]
    async fn selection_rejects_positive_reviews() {
        let catalog = FixtureCatalog::demo();
        let business = catalog
            .search(&SearchQuery::new("Cafe Sonne", ""))
            .await
            .expect("fixture business");
        let reviews = catalog.reviews(&business).await.expect("fixture reviews").records;
        assert!(select_reviews(&reviews, &["r-1".to_string()]).is_err());
        let selection = select_reviews(&reviews, &["r-2".to_string(), "r-2".to_string()])
            .expect("selectable");
        assert_eq!(selection.len(), 1);
    }
}
