use anyhow::Result;
use apisvc::commands::{self, Config, DEFAULT_UPLOAD_FIELD, Overrides};
use apisvc::config::{BASE_URL_ENV, DOWNLOAD_DIR_ENV, TIMEOUT_ENV};
use apisvc::http::RequestOptions;
use clap::Parser;
use std::path::PathBuf;

/// apisvc - call envelope-style JSON APIs from the command line
///
/// Responses are expected as {"code": 0, "data": ..., "message": "..."}; the
/// `data` of a successful call is printed as JSON. Any other code, HTTP error
/// or network failure exits non-zero with a readable message.
///
/// Examples:
///   apisvc --base-url https://api.example.com get /users/1
///   apisvc login <TOKEN>      # sent as "Authorization: Bearer <TOKEN>"
#[derive(Parser, Debug)]
#[command(author, version = env!("APISVC_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL relative paths are resolved against
    #[arg(long, env = BASE_URL_ENV, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Request timeout in milliseconds (default 15000)
    #[arg(long, env = TIMEOUT_ENV, value_name = "MS", global = true)]
    pub timeout: Option<u64>,

    /// Token storage file (defaults to the user config directory)
    #[arg(long, env = "APISVC_STORAGE", value_name = "PATH", global = true)]
    pub storage: Option<PathBuf>,

    /// Suppress notices; errors are still logged and reported on exit
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Show a loading indicator while the request is in flight
    #[arg(long, global = true)]
    pub loading: bool,

    /// Print a success notice with this message
    #[arg(long, value_name = "TEXT", global = true)]
    pub success_message: Option<String>,

    /// Extra request header, e.g. -H "X-Trace: 1"
    #[arg(long = "header", short = 'H', value_name = "NAME: VALUE", global = true)]
    pub headers: Vec<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// GET a resource
    Get(UrlArgs),

    /// POST a JSON body
    Post(BodyArgs),

    /// PUT a JSON body
    Put(BodyArgs),

    /// DELETE a resource
    Delete(UrlArgs),

    /// Upload a file as multipart/form-data
    Upload(UploadArgs),

    /// Download a file into a directory
    Download(DownloadArgs),

    /// Store the bearer token
    Login(LoginArgs),

    /// Forget the bearer token
    Logout,
}

#[derive(clap::Args, Debug)]
pub struct UrlArgs {
    /// Path relative to the base URL, or an absolute URL
    #[arg(value_name = "URL")]
    pub url: String,
}

#[derive(clap::Args, Debug)]
pub struct BodyArgs {
    #[arg(value_name = "URL")]
    pub url: String,

    /// JSON request body
    #[arg(long, short = 'd', value_name = "JSON")]
    pub data: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct UploadArgs {
    #[arg(value_name = "URL")]
    pub url: String,

    /// File to upload
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: PathBuf,

    /// Form field name
    #[arg(long, default_value = DEFAULT_UPLOAD_FIELD)]
    pub field: String,
}

#[derive(clap::Args, Debug)]
pub struct DownloadArgs {
    #[arg(value_name = "URL")]
    pub url: String,

    /// Target directory (defaults to the current directory)
    #[arg(long, env = DOWNLOAD_DIR_ENV, value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    #[arg(value_name = "TOKEN")]
    pub token: String,
}

impl Cli {
    fn request_options(&self) -> Result<RequestOptions> {
        let mut opts = RequestOptions::new().show_loading(self.loading);
        if let Some(message) = &self.success_message {
            opts = opts.success_message(message.clone());
        }
        for header in &self.headers {
            let (name, value) = header
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("Invalid header {:?}, expected NAME: VALUE", header))?;
            opts = opts.header(name.trim(), value.trim());
        }
        Ok(opts)
    }

    fn overrides(&self) -> Overrides {
        let download_dir = match &self.command {
            Commands::Download(args) => args.dir.clone(),
            _ => None,
        };
        Overrides {
            base_url: self.base_url.clone(),
            timeout_ms: self.timeout,
            download_dir,
            storage_path: self.storage.clone(),
            quiet: self.quiet,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let opts = cli.request_options()?;
    let config = Config::new(apisvc::runtime::RealRuntime, cli.overrides())?;
    let client = &config.client;
    let mut stdout = std::io::stdout();

    match cli.command {
        Commands::Get(args) => commands::get(client, &args.url, opts, &mut stdout).await?,
        Commands::Post(args) => {
            commands::post(client, &args.url, args.data.as_deref(), opts, &mut stdout).await?
        }
        Commands::Put(args) => {
            commands::put(client, &args.url, args.data.as_deref(), opts, &mut stdout).await?
        }
        Commands::Delete(args) => commands::delete(client, &args.url, opts, &mut stdout).await?,
        Commands::Upload(args) => {
            commands::upload(
                client,
                &config.runtime,
                &args.url,
                &args.file,
                &args.field,
                opts,
                &mut stdout,
            )
            .await?
        }
        Commands::Download(args) => {
            commands::download(client, &args.url, opts, &mut stdout).await?
        }
        Commands::Login(args) => commands::login(config.storage.as_ref(), &args.token, &mut stdout)?,
        Commands::Logout => commands::logout(config.storage.as_ref(), &mut stdout)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_get_parsing() {
        let cli = Cli::try_parse_from(["apisvc", "get", "/users/1"]).unwrap();
        match cli.command {
            Commands::Get(args) => assert_eq!(args.url, "/users/1"),
            _ => panic!("Expected Get command"),
        }
        assert!(!cli.quiet);
    }

    #[test]
    fn test_cli_post_with_data() {
        let cli =
            Cli::try_parse_from(["apisvc", "post", "/users", "--data", r#"{"a":1}"#]).unwrap();
        match cli.command {
            Commands::Post(args) => {
                assert_eq!(args.url, "/users");
                assert_eq!(args.data.as_deref(), Some(r#"{"a":1}"#));
            }
            _ => panic!("Expected Post command"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "apisvc",
            "get",
            "/x",
            "--base-url",
            "http://api.example",
            "--timeout",
            "500",
            "-q",
            "--loading",
            "-H",
            "X-Trace: 1",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://api.example"));
        assert_eq!(cli.timeout, Some(500));
        assert!(cli.quiet);

        let opts = cli.request_options().unwrap();
        assert!(opts.show_loading);
        assert_eq!(opts.headers, vec![("X-Trace".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_cli_invalid_header_is_rejected() {
        let cli = Cli::try_parse_from(["apisvc", "get", "/x", "-H", "no-colon"]).unwrap();
        assert!(cli.request_options().is_err());
    }

    #[test]
    fn test_cli_upload_default_field() {
        let cli = Cli::try_parse_from(["apisvc", "upload", "/files", "--file", "a.txt"]).unwrap();
        match cli.command {
            Commands::Upload(args) => {
                assert_eq!(args.field, "file");
                assert_eq!(args.file, PathBuf::from("a.txt"));
            }
            _ => panic!("Expected Upload command"),
        }
    }

    #[test]
    fn test_cli_download_dir_overrides() {
        let cli = Cli::try_parse_from(["apisvc", "download", "/f.csv", "--dir", "/tmp/out"]).unwrap();
        assert_eq!(cli.overrides().download_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        assert!(Cli::try_parse_from(["apisvc", "/users"]).is_err());
    }
}
