//! Command dispatch and the shared client/cache wiring.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use tracing::warn;

use inde_core::auth::{
    CookieStore, CredentialStore, FileCookieStore, HistoryNavigator, MemoryCookieStore, LOGIN_PATH,
    OAUTH_FAILED_REDIRECT, UNAUTHORIZED_REDIRECT,
};
use inde_core::cache::FileStorage;
use inde_core::config::Config;
use inde_core::models::{display_name, selectable_options, ListQuery, SocialProvider, POSITION_PARENT};
use inde_core::{ApiClient, ReferenceCache, Session};

const COOKIE_JAR_FILE: &str = "cookies.jar";
const CODE_CACHE_DIR: &str = "codes";

/// Everything a command needs, built once per invocation.
pub struct Context {
    config: Config,
    credentials: CredentialStore,
    client: ApiClient,
    codes: ReferenceCache<FileStorage, ApiClient>,
    navigator: Arc<HistoryNavigator>,
}

impl Context {
    pub fn new(config: Config, command: &str) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        Self::build(config, command, cache_dir, CredentialStore::os())
    }

    fn build(config: Config, command: &str, cache_dir: PathBuf, credentials: CredentialStore) -> Result<Self> {
        let env = config.environment();
        std::fs::create_dir_all(&cache_dir)?;

        let session = Session::new(open_cookie_store(&cache_dir, &credentials), env.is_production());

        let navigator = Arc::new(HistoryNavigator::new(start_path(command)));
        let client = ApiClient::new(env, session, navigator.clone())?;
        let storage = FileStorage::new(cache_dir.join(CODE_CACHE_DIR))?;
        let codes = ReferenceCache::new(storage, client.clone());

        Ok(Self {
            config,
            credentials,
            client,
            codes,
            navigator,
        })
    }

    /// Explain a forced trip back to the login page, if one happened.
    pub fn report_redirect(&self) {
        match self.navigator.last().as_deref() {
            Some(UNAUTHORIZED_REDIRECT) => {
                eprintln!("Session expired or was rejected. Run `inde login` to sign in again.")
            }
            Some(OAUTH_FAILED_REDIRECT) => eprintln!("Social login failed. Try signing in again."),
            _ => {}
        }
    }
}

/// The sealed jar in the cache dir, or cookies that last only for this run
/// when the keychain cannot supply a key.
fn open_cookie_store(cache_dir: &Path, credentials: &CredentialStore) -> Arc<dyn CookieStore> {
    let jar = credentials
        .jar_key()
        .and_then(|key| FileCookieStore::open(cache_dir.join(COOKIE_JAR_FILE), key));
    match jar {
        Ok(jar) => Arc::new(jar),
        Err(e) => {
            warn!(error = %e, "Cookie jar unavailable, session will not be kept");
            Arc::new(MemoryCookieStore::new())
        }
    }
}

/// Where the command "is" when it starts; login commands start on the
/// login page so a 401 there does not count as a redirect.
fn start_path(command: &str) -> &'static str {
    match command {
        "login" | "oauth" => LOGIN_PATH,
        _ => "/",
    }
}

pub async fn run(ctx: &Context, command: &str, args: &[String]) -> Result<()> {
    match command {
        "login" => login(ctx, args).await,
        "logout" => logout(ctx).await,
        "whoami" => whoami(ctx).await,
        "oauth" => oauth(ctx, args).await,
        "social-url" => social_url(ctx, args),
        "codes" => codes(ctx, args).await,
        "warm" => {
            match ctx.codes.init().await {
                0 => println!("System codes already cached (or the server returned none)"),
                loaded => println!("Cached {} code groups", loaded),
            }
            Ok(())
        }
        "clear-cache" => {
            ctx.codes.clear();
            println!("System code cache cleared");
            Ok(())
        }
        "notices" => notices(ctx, args).await,
        "faqs" => faqs(ctx, args).await,
        "inquiries" => inquiries(ctx, args).await,
        other => bail!("Unknown command '{}'. Run `inde --help` for usage.", other),
    }
}

// ===== Account =====

async fn login(ctx: &Context, args: &[String]) -> Result<()> {
    let remember = args.iter().any(|a| a == "--remember");
    let email = match args.iter().find(|a| !a.starts_with("--")) {
        Some(email) => email.clone(),
        None => match ctx.config.last_email.clone() {
            Some(email) => email,
            None => prompt_email()?,
        },
    };

    let password = match ctx.credentials.remembered_password(&email) {
        Some(password) if !remember => password,
        _ => rpassword::prompt_password("Password: ")?,
    };
    if email.is_empty() || password.is_empty() {
        bail!("Email and password required");
    }

    let response = ctx.client.login(&email, &password).await?;
    if !ctx.client.session().is_authenticated() {
        bail!("Server did not issue a session");
    }

    if remember {
        if let Err(e) = ctx.credentials.remember_password(&email, &password) {
            warn!(error = %e, "Failed to store credentials");
        }
    }
    let mut config = ctx.config.clone();
    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    let loaded = ctx.codes.init().await;
    println!("Signed in as {}", response.user.display_name());
    println!("Loaded {} code groups", loaded);
    println!("Next: {}", response.user.landing_route().path());
    Ok(())
}

/// Sign out and forget any remembered password for the last account.
async fn logout(ctx: &Context) -> Result<()> {
    ctx.client.logout().await?;
    if let Some(ref email) = ctx.config.last_email {
        if let Err(e) = ctx.credentials.forget_password(email) {
            warn!(error = %e, "Failed to forget remembered password");
        }
    }
    println!("Signed out");
    Ok(())
}

fn prompt_email() -> Result<String> {
    print!("Email: ");
    io::stdout().flush()?;

    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    Ok(email.trim().to_string())
}

async fn whoami(ctx: &Context) -> Result<()> {
    if !ctx.client.session().is_authenticated() {
        bail!("Not signed in");
    }
    let user = ctx.client.me().await?;
    ctx.client.session().save_user(&user)?;

    println!("{} <{}>", user.display_name(), user.email);
    if let Some(ref position) = user.position {
        let positions = ctx.codes.get_with_cache_fallback(POSITION_PARENT).await;
        println!("Position: {}", display_name(&positions, position));
    }
    if !user.profile_completed {
        println!("Profile incomplete: finish signup at /signup/complete");
    }
    Ok(())
}

async fn oauth(ctx: &Context, args: &[String]) -> Result<()> {
    let [access, refresh] = args else {
        bail!("Usage: inde oauth <access_token> <refresh_token>");
    };
    let route = ctx.client.oauth_callback(access, refresh).await?;
    ctx.codes.init().await;
    println!("Signed in. Next: {}", route.path());
    Ok(())
}

fn social_url(ctx: &Context, args: &[String]) -> Result<()> {
    let provider: SocialProvider = args
        .first()
        .ok_or_else(|| anyhow!("Usage: inde social-url <google|kakao|naver> [--signup]"))?
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let signup = args.iter().any(|a| a == "--signup");
    println!("{}", ctx.client.social_login_url(provider, signup));
    Ok(())
}

// ===== System codes =====

async fn codes(ctx: &Context, args: &[String]) -> Result<()> {
    let parent_id = args
        .first()
        .ok_or_else(|| anyhow!("Usage: inde codes <parent_id>"))?;
    let items = selectable_options(&ctx.codes.get_with_cache_fallback(parent_id).await);
    if items.is_empty() {
        println!("No codes for {}", parent_id);
    }
    for item in items {
        println!("{:<16} {}", item.value, item.name);
    }
    Ok(())
}

// ===== Boards =====

fn page_query(args: &[String]) -> Result<ListQuery> {
    let page = match args.first() {
        Some(page) => Some(page.parse().map_err(|_| anyhow!("Invalid page number '{}'", page))?),
        None => None,
    };
    Ok(ListQuery {
        page,
        ..ListQuery::default()
    })
}

async fn notices(ctx: &Context, args: &[String]) -> Result<()> {
    let page = ctx.client.fetch_notices(&page_query(args)?).await?;
    for notice in &page.results {
        let pin = if notice.is_pinned { "*" } else { " " };
        println!("{}{:>5}  {}  {}", pin, notice.id, notice.created_at, notice.title);
    }
    println!("{} notices", page.count);
    Ok(())
}

async fn faqs(ctx: &Context, args: &[String]) -> Result<()> {
    let page = ctx.client.fetch_faqs(&page_query(args)?).await?;
    for faq in &page.results {
        println!("Q. {}\nA. {}\n", faq.question, faq.answer);
    }
    Ok(())
}

async fn inquiries(ctx: &Context, args: &[String]) -> Result<()> {
    let page = ctx.client.fetch_inquiries(&page_query(args)?).await?;
    for inquiry in &page.results {
        let state = if inquiry.is_answered() { "answered" } else { "waiting" };
        println!("{:>5}  {:<8}  {}", inquiry.id, state, inquiry.title);
    }
    println!("{} inquiries", page.count);
    Ok(())
}
