//! Portal CLI: command-line client for the compliance document portal.
//!
//! Set PORTAL_API_URL (default http://localhost:4000). The session is kept in
//! PORTAL_SESSION_FILE or the user config directory.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use portal_api_client::{ApiClient, ApiError, Auth};
use portal_cli::session::{Principal, SessionError, SessionFile, StoredSession};
use portal_cli::{init_tracing, render};
use portal_core::models::{
    Checklist, CompanyResponse, CreateCompanyRequest, DocumentType, UpdateCompanyRequest,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "portal", about = "Compliance document portal client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in as a company
    Login {
        username: String,
        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Refresh and show the document checklist
    Status,
    /// Check or uncheck a document type locally
    Toggle {
        /// Document type name or checklist position (1-10)
        doc_type: DocumentType,
    },
    /// Choose a local file for a document type
    Select {
        doc_type: DocumentType,
        file: PathBuf,
    },
    /// Upload the selected files, or one file given directly
    Upload {
        doc_type: Option<DocumentType>,
        file: Option<PathBuf>,
    },
    /// Delete the received document of a type
    Delete { doc_type: DocumentType },
    /// List uploaded documents with download links
    Docs,
    /// Download the received document of a type
    Download {
        doc_type: DocumentType,
        /// Output path (defaults to the uploaded file name)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a bcrypt hash for ADMIN_PASSWORD_HASH
    HashPassword {
        #[arg(long, default_value_t = bcrypt::DEFAULT_COST)]
        cost: u32,
    },
    /// Operator commands
    Admin {
        #[command(subcommand)]
        sub: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Log in as the operator
    Login {
        username: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// List companies, optionally filtered by username or name
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Create a company account
    Create {
        username: String,
        company_name: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Change a company's username, name or password
    Update {
        id: Uuid,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        company_name: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete a company and its documents
    Delete { id: Uuid },
    /// List a company's documents
    Documents { id: Uuid },
    /// Remove stored files no record points to
    Sweep,
}

/// Use the given password or prompt for one on stdin.
fn read_password(given: Option<String>, prompt: &str) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    eprint!("{}: ", prompt);
    std::io::stderr().flush().ok();
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// A rejected session ends it locally as well.
fn end_session_on_unauthorized(file: &SessionFile, err: anyhow::Error) -> anyhow::Error {
    let rejected = err
        .downcast_ref::<ApiError>()
        .filter(|api| api.is_unauthorized())
        .map(|api| api.message.clone());
    match rejected {
        Some(message) => {
            if let Err(e) = file.clear() {
                tracing::warn!(error = %e, "Failed to remove rejected session");
            }
            anyhow::Error::new(SessionError::NotLoggedIn).context(message)
        }
        None => err,
    }
}

/// A logged-in company: its session, file and an authenticated client.
struct CompanySession {
    file: SessionFile,
    token: String,
    expires_at: chrono::DateTime<Utc>,
    company: CompanyResponse,
    checklist: Checklist,
    client: ApiClient,
}

impl CompanySession {
    fn load(file: SessionFile, base: &ApiClient) -> Result<Self> {
        let session = file.load(Utc::now())?;
        match session.principal {
            Principal::Company { company, checklist } => Ok(Self {
                client: base.with_auth(Auth::Bearer(session.token.clone())),
                file,
                token: session.token,
                expires_at: session.expires_at,
                company,
                checklist,
            }),
            Principal::Admin { .. } => Err(SessionError::WrongRole {
                needed: "a company",
                hint: "portal login",
            }
            .into()),
        }
    }

    fn save(&self) -> Result<()> {
        self.file.save(&StoredSession {
            token: self.token.clone(),
            expires_at: self.expires_at,
            principal: Principal::Company {
                company: self.company.clone(),
                checklist: self.checklist.clone(),
            },
        })?;
        Ok(())
    }

    /// Reload from the server. Remote state replaces the local view.
    async fn refresh(&mut self) -> Result<()> {
        let response = self
            .client
            .checklist()
            .await
            .map_err(|e| end_session_on_unauthorized(&self.file, e))?;
        self.company.username = response.company_username.clone();
        self.checklist = response.into_checklist();
        self.save()
    }

    fn print(&self) {
        print!("{}", render::checklist(&self.company.company_name, &self.checklist));
    }

    fn fail(&self, err: anyhow::Error) -> anyhow::Error {
        end_session_on_unauthorized(&self.file, err)
    }
}

fn admin_client(file: &SessionFile, base: &ApiClient) -> Result<ApiClient> {
    let session = file.load(Utc::now())?;
    match session.principal {
        Principal::Admin { .. } => Ok(base.with_auth(Auth::Bearer(session.token))),
        Principal::Company { .. } => Err(SessionError::WrongRole {
            needed: "an operator",
            hint: "portal admin login",
        }
        .into()),
    }
}

async fn upload_pending(session: &mut CompanySession) -> Result<()> {
    let pending: Vec<(DocumentType, String)> = session
        .checklist
        .entries()
        .iter()
        .filter_map(|e| e.pending_file.clone().map(|f| (e.doc_type, f)))
        .collect();
    if pending.is_empty() {
        anyhow::bail!("No file selected. Use `portal select <type> <file>` first.");
    }

    let mut failures: Vec<(DocumentType, String)> = Vec::new();
    for (doc_type, file) in pending {
        match session
            .client
            .upload_document(doc_type, std::path::Path::new(&file))
            .await
        {
            Ok(entry) => {
                println!("Uploaded {} ({})", doc_type, file);
                *session.checklist.entry_mut(doc_type) = entry;
            }
            Err(e) => {
                let e = session.fail(e);
                if e.downcast_ref::<SessionError>().is_some() {
                    return Err(e);
                }
                eprintln!("Upload of {} failed: {:#}", doc_type, e);
                failures.push((doc_type, format!("{:#}", e)));
            }
        }
    }

    session.refresh().await?;
    for (doc_type, message) in &failures {
        session.checklist.apply_upload_failure(*doc_type, message.clone());
    }
    session.save()?;
    session.print();

    if failures.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} upload(s) failed", failures.len())
    }
}

async fn run_company(command: Commands, file: SessionFile, client: &ApiClient) -> Result<()> {
    let mut session = CompanySession::load(file, client)?;

    match command {
        Commands::Status => {
            session.refresh().await?;
            session.print();
        }
        Commands::Toggle { doc_type } => {
            let checked = session.checklist.toggle(doc_type);
            session.save()?;
            println!(
                "{} {}",
                doc_type,
                if checked { "checked" } else { "unchecked" }
            );
            session.print();
        }
        Commands::Select { doc_type, file } => {
            if !file.is_file() {
                anyhow::bail!("Not a file: {}", file.display());
            }
            let path = file
                .canonicalize()
                .unwrap_or(file)
                .to_string_lossy()
                .to_string();
            session.checklist.select_file(doc_type, path);
            session.save()?;
            session.print();
        }
        Commands::Upload { doc_type, file } => {
            match (doc_type, file) {
                (Some(doc_type), Some(file)) => session
                    .checklist
                    .select_file(doc_type, file.to_string_lossy().to_string()),
                (None, None) => {}
                _ => anyhow::bail!("Give both a document type and a file, or neither"),
            }
            upload_pending(&mut session).await?;
        }
        Commands::Delete { doc_type } => {
            session.refresh().await?;
            let record_id = session
                .checklist
                .entry(doc_type)
                .record_id
                .with_context(|| format!("No {} has been received", doc_type))?;

            let result = session.client.delete_document(record_id).await;
            if let Err(e) = result {
                let e = session.fail(e);
                if e.downcast_ref::<SessionError>().is_none() {
                    session.refresh().await?;
                    session.print();
                }
                return Err(e.context(format!("Failed to delete {}", doc_type)));
            }
            session.checklist.apply_delete(doc_type);
            println!("Deleted {}", doc_type);
            session.refresh().await?;
            session.print();
        }
        Commands::Docs => {
            let documents = session
                .client
                .list_documents()
                .await
                .map_err(|e| session.fail(e))?;
            print!("{}", render::documents(&documents));
        }
        Commands::Download { doc_type, out } => {
            let documents = session
                .client
                .list_documents()
                .await
                .map_err(|e| session.fail(e))?;
            let document = documents
                .into_iter()
                .find(|d| d.doc_type == doc_type.as_str())
                .with_context(|| format!("No {} has been received", doc_type))?;
            let url = document
                .download_url
                .context("The server did not return a download link")?;
            let data = session.client.fetch_url(&url).await?;
            let out = out.unwrap_or_else(|| PathBuf::from(&document.original_name));
            std::fs::write(&out, &data)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Saved {} ({} bytes)", out.display(), data.len());
        }
        _ => anyhow::bail!("Not a company command"),
    }
    Ok(())
}

async fn run_admin(sub: AdminCommands, file: SessionFile, base: &ApiClient) -> Result<()> {
    if let AdminCommands::Login { username, password } = sub {
        let password = read_password(password, "Operator password")?;
        let response = base.admin_login(&username, &password).await?;
        file.save(&StoredSession {
            token: response.token,
            expires_at: response.expires_at,
            principal: Principal::Admin {
                username: response.username.clone(),
            },
        })?;
        println!(
            "Logged in as operator {} until {}",
            response.username,
            response.expires_at.format("%Y-%m-%d %H:%M UTC")
        );
        return Ok(());
    }

    let client = admin_client(&file, base)?;
    let result = match sub {
        AdminCommands::Login { .. } => Ok(()),
        AdminCommands::List { search } => client
            .list_companies(search.as_deref())
            .await
            .map(|companies| print!("{}", render::companies(&companies))),
        AdminCommands::Create {
            username,
            company_name,
            password,
        } => {
            let password = read_password(password, "Company password")?;
            let request = CreateCompanyRequest {
                username,
                company_name,
                password,
            };
            client
                .create_company(&request)
                .await
                .map(|company| println!("Created {} ({})", company.username, company.id))
        }
        AdminCommands::Update {
            id,
            username,
            company_name,
            password,
        } => {
            let request = UpdateCompanyRequest {
                username,
                company_name,
                password,
            };
            client
                .update_company(id, &request)
                .await
                .map(|company| println!("Updated {} ({})", company.username, company.id))
        }
        AdminCommands::Delete { id } => client
            .delete_company(id)
            .await
            .map(|()| println!("Deleted company {}", id)),
        AdminCommands::Documents { id } => client
            .company_documents(id)
            .await
            .map(|documents| print!("{}", render::documents(&documents))),
        AdminCommands::Sweep => client
            .run_sweep()
            .await
            .map(|report| print!("{}", render::sweep(&report))),
    };
    result.map_err(|e| end_session_on_unauthorized(&file, e))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let file = SessionFile::from_env();
    let client = ApiClient::from_env(Auth::Anonymous)
        .context("Failed to create API client. Check PORTAL_API_URL")?;

    match cli.command {
        Commands::Login { username, password } => {
            let password = read_password(password, "Password")?;
            let response = client.login(&username, &password).await?;
            let mut session = CompanySession {
                client: client.with_auth(Auth::Bearer(response.token.clone())),
                file,
                token: response.token,
                expires_at: response.expires_at,
                company: response.company,
                checklist: Checklist::new(),
            };
            session.save()?;
            println!("Logged in as {}", session.company.company_name);
            session.refresh().await?;
            session.print();
        }
        Commands::Logout => {
            file.clear()?;
            println!("Logged out.");
        }
        Commands::HashPassword { cost } => {
            let password = read_password(None, "Password to hash")?;
            if password.is_empty() {
                anyhow::bail!("Password must not be empty");
            }
            let hash = bcrypt::hash(password, cost).context("Failed to hash password")?;
            println!("{}", hash);
        }
        Commands::Admin { sub } => run_admin(sub, file, &client).await?,
        command => run_company(command, file, &client).await?,
    }

    Ok(())
}
