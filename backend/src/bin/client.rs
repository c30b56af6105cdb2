use batch_portal::client::{ClientError, PortalClient, TokenStore};
use batch_portal::version::VERSION;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version = VERSION, about = "Command-line client for the batch portal", long_about = None)]
struct Args {
    /// Base URL of the portal server
    #[arg(long, env = "PORTAL_URL", default_value = "http://127.0.0.1:5000")]
    url: String,

    /// File the session token is kept in
    #[arg(long, env = "PORTAL_STATE_FILE", default_value = ".portal_session.json")]
    state_file: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Submit a batch job
    StartBatch {
        #[arg(long, default_value_t = 0.0)]
        old_patients_target: f64,
        #[arg(long)]
        import_setup_id: f64,
        #[arg(long, default_value_t = 60.0)]
        hourly_batch_count: f64,
    },
    /// List recorded batch jobs
    Jobs,
    /// Check the stored session token against the server
    Verify,
    /// Forget the stored session token
    Logout,
}

async fn run(client: &PortalClient, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Login { email, password } => {
            let response = client.login(&email, &password).await?;
            println!("Logged in as {} (id {})", response.user.email, response.user.id);
        }
        Command::StartBatch {
            old_patients_target,
            import_setup_id,
            hourly_batch_count,
        } => {
            let form = json!({
                "oldPatientsTarget": old_patients_target,
                "importSetupId": import_setup_id,
                "hourlyBatchCount": hourly_batch_count,
            });
            let job = client.start_batch(&form).await?;
            println!("Batch started successfully! job #{} is {}", job.id, job.status);
        }
        Command::Jobs => {
            for job in client.list_batch_jobs().await? {
                println!(
                    "#{} {} import={} oldPatients={} hourly={} created={}",
                    job.id,
                    job.status,
                    job.import_setup_id,
                    job.old_patients_target,
                    job.hourly_batch_count,
                    job.created_at.to_rfc3339()
                );
            }
        }
        Command::Verify => {
            let claims = client.verify().await?;
            println!("Session valid for {} (id {})", claims.email, claims.user_id);
        }
        Command::Logout => {
            client.logout()?;
            println!("Logged out");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = PortalClient::new(args.url, TokenStore::new(args.state_file));

    let needs_session = !matches!(args.command, Command::Login { .. } | Command::Logout);
    if needs_session && !client.is_authenticated()? {
        eprintln!("Not logged in. Run `portal-client login` first.");
        std::process::exit(1);
    }

    run(&client, args.command).await?;
    Ok(())
}
