//! Drives the login page from a terminal.
//!
//! With `SUPABASE_URL` and `SUPABASE_ANON_KEY` set, commands go to a real
//! Supabase project. Without them an in-memory provider is used that
//! knows a single account, `demo@example.com` / `demo-password`.

use clap::{Parser, Subcommand};
use coregate::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

const DEMO_EMAIL: &str = "demo@example.com";
const DEMO_PASSWORD: &str = "demo-password";

/// Coregate terminal demo
#[derive(Parser, Debug)]
#[command(name = "coregate-terminal")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL", requires = "anon_key")]
    supabase_url: Option<Url>,

    /// Supabase anon (public) key
    #[arg(long, env = "SUPABASE_ANON_KEY")]
    anon_key: Option<String>,

    /// Application origin used in password-reset links
    #[arg(long, env = "COREGATE_ORIGIN", default_value = "http://localhost:3000")]
    origin: Url,

    /// Backend serving /api/profile
    #[arg(long, env = "COREGATE_BACKEND_URL", default_value = "http://localhost:8001")]
    backend_url: Url,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in, open the dashboard and show the profile
    SignIn { email: String, password: String },
    /// Register a new account
    SignUp { email: String, password: String },
    /// Email a password-reset link
    Reset { email: String },
    /// Resolve the initial session and show where "/" lands
    Whoami,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coregate=info,coregate_terminal=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let builder = AuthContext::<MockProvider>::builder()
        .origin(cli.origin.clone())
        .backend_url(cli.backend_url.clone());

    match (cli.supabase_url.clone(), cli.anon_key.clone()) {
        (Some(url), Some(key)) => {
            let provider = SupabaseProvider::new(SupabaseConfig::new(url, key))?;
            run(builder.build(provider)?, cli.command).await
        }
        _ => {
            tracing::info!(email = DEMO_EMAIL, "using in-memory provider");
            let provider = MockProvider::new().with_account(DEMO_EMAIL, DEMO_PASSWORD);
            run(builder.build(provider)?, cli.command).await
        }
    }
}

async fn run<P: IdentityProvider>(
    context: AuthContext<P>,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = context.start().await;
    let page = context.navigator("/");
    println!("auth state: {state}");
    println!("landed on:  {}", page.current_route());

    match command {
        Command::Whoami => {}
        Command::SignIn { email, password } => {
            let form = context.login_form();
            println!("[{}]", form.button_label());
            match form.submit(&email, &password).await {
                Ok(LoginOutcome::Navigate(route)) => {
                    // The store follows the provider's event, not the form.
                    let _ = context
                        .store()
                        .changes()
                        .wait_for(AuthState::is_authenticated)
                        .await;
                    let view = page.navigate(route.path())?;
                    report(&form.state());
                    println!("now showing: {}", describe(&view));
                    show_profile(&context).await;
                    context.sign_out().await?;
                }
                Ok(LoginOutcome::AwaitingConfirmation) => report(&form.state()),
                Err(err) => report_error(&err),
            }
        }
        Command::SignUp { email, password } => {
            let mut form = context.login_form();
            form.toggle_mode();
            println!("[{}]", form.button_label());
            match form.submit(&email, &password).await {
                Ok(_) => report(&form.state()),
                Err(err) => report_error(&err),
            }
        }
        Command::Reset { email } => {
            let form = context.login_form();
            match form.forgot_password(&email).await {
                Ok(()) => report(&form.state()),
                Err(err) => report_error(&err),
            }
        }
    }

    context.shutdown().await;
    Ok(())
}

async fn show_profile<P: IdentityProvider>(context: &AuthContext<P>) {
    match context.load_profile().await {
        ProfileSlot::Loaded(profile) => {
            println!("  email:        {}", profile.email);
            println!("  name:         {}", profile.display_name());
            println!("  member since: {}", profile.member_since());
        }
        ProfileSlot::Loading | ProfileSlot::Unavailable => {
            println!("  profile unavailable");
        }
    }
}

fn describe(view: &View) -> String {
    match view {
        View::Blank => "(nothing)".to_string(),
        View::Page(route) => route.path().to_string(),
    }
}

fn report(state: &SubmissionState) {
    match state {
        SubmissionState::Succeeded(message) => println!("{message}"),
        SubmissionState::Failed(message) => println!("error: {message}"),
        SubmissionState::Idle | SubmissionState::Submitting => {}
    }
}

fn report_error(err: &FlowError) {
    let message = err.user_message().unwrap_or_else(|| err.to_string());
    println!("error: {message}");
}
