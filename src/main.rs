use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use storefront_media::config::{self, MediaConfig};
use storefront_media::imaging::{RustBackend, compress_image, compress_many};
use storefront_media::media::{MediaFile, first_duplicate_name, mime_for_path};
use storefront_media::output;
use storefront_media::transport::ReqwestTransport;
use storefront_media::upload::{Session, UploadClient, UploadFolder, UploadOptions};
use storefront_media::validation::validate_file;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

/// Files named on the command line and/or found under a directory.
#[derive(clap::Args, Clone)]
struct InputArgs {
    /// Media files to process
    files: Vec<PathBuf>,

    /// Also take every recognized media file under this directory
    #[arg(long)]
    dir: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "storefront-media")]
#[command(about = "Media pipeline for the storefront admin console")]
#[command(long_about = "\
Media pipeline for the storefront admin console

Files go through the same steps as in the product editor:

  validate   type and size allow-list (images ≤ 100MB, videos ≤ 20MB)
  compress   images only: WebP, width ≤ 1920px, highest quality under 2MB
  upload     multipart POST to the storefront API, returns public URLs
  delete     advisory removal of a bucket object by public URL
  cdn-url    append CDN resize/quality/format parameters to a bucket URL

Credentials come from --token / STOREFRONT_TOKEN and --tenant /
STOREFRONT_TENANT. Set RUST_LOG to change log verbosity.

Run 'storefront-media gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Storefront API root (overrides api.base_url)
    #[arg(long, env = "STOREFRONT_API_URL", global = true)]
    api_url: Option<String>,

    /// Admin bearer token
    #[arg(long, env = "STOREFRONT_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Tenant id sent as x-tenant-id (overrides api.tenant_id)
    #[arg(long, env = "STOREFRONT_TENANT", global = true)]
    tenant: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check files against the type and size allow-list
    Validate(InputArgs),
    /// Compress images to WebP under the byte target
    Compress {
        #[command(flatten)]
        input: InputArgs,
        /// Where compressed files are written
        #[arg(long, default_value = "compressed")]
        out: PathBuf,
        /// Byte target in MB (overrides compression.target_mb)
        #[arg(long, conflicts_with = "relaxed", value_parser = config::parse_target_mb)]
        target_mb: Option<f64>,
        /// Use compression.relaxed_target_mb as the target
        #[arg(long)]
        relaxed: bool,
    },
    /// Validate, compress and upload files in order
    Upload {
        #[command(flatten)]
        input: InputArgs,
        /// Destination folder: banners, products, logos, about, categories
        #[arg(long, default_value = "products")]
        folder: UploadFolder,
        /// Use compression.relaxed_target_mb for images
        #[arg(long)]
        relaxed: bool,
    },
    /// Delete stored objects by public URL
    Delete {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Print the CDN-optimized form of a URL
    CdnUrl {
        url: String,
        #[arg(long)]
        width: Option<u32>,
        /// Overrides cdn.quality
        #[arg(long)]
        quality: Option<u32>,
        /// Overrides cdn.format
        #[arg(long)]
        format: Option<String>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let media_config = match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        _ => config::load_config(&cli.config_dir)?,
    };
    init_thread_pool(&media_config.processing);

    match &cli.command {
        Command::Validate(input) => {
            let files = read_inputs(input)?;
            let limits = media_config.limits();
            let results: Vec<_> = files
                .iter()
                .map(|f| (f, validate_file(f, &limits)))
                .collect();
            output::print_validation(&results);
        }
        Command::Compress {
            input,
            out,
            target_mb,
            relaxed,
        } => {
            let files = read_inputs(input)?;
            let mut options = media_config.compress_options(*relaxed);
            if let Some(mb) = target_mb {
                options.target_mb = *mb;
            }
            let backend = RustBackend::new();
            let results: Vec<_> = files
                .par_iter()
                .map(|f| (f, compress_image(&backend, f, &options)))
                .collect();

            let written = results
                .iter()
                .filter_map(|(_, r)| r.as_ref().ok())
                .map(|c| c.file.name.as_str());
            if let Some(name) = first_duplicate_name(written) {
                return Err(format!(
                    "several inputs compress to {name}; rename them or compress them separately"
                )
                .into());
            }

            std::fs::create_dir_all(out)?;
            for (_, result) in &results {
                if let Ok(compressed) = result {
                    std::fs::write(out.join(&compressed.file.name), &compressed.file.bytes)?;
                }
            }
            output::print_compression(&results);
        }
        Command::Upload {
            input,
            folder,
            relaxed,
        } => {
            let files = read_inputs(input)?;
            let limits = media_config.limits();
            for file in &files {
                validate_file(file, &limits)?;
            }
            let prepared = prepare_for_upload(files, &media_config.compress_options(*relaxed))?;

            let client = upload_client(&cli, &media_config)?;
            let session = session(&cli, &media_config);
            let urls = client
                .upload_many(
                    &session,
                    &prepared,
                    UploadOptions::new(*folder).on_progress(|p| info!(progress = p, "uploading")),
                )
                .await?;

            let uploaded: Vec<(String, String)> = prepared
                .iter()
                .map(|f| f.name.clone())
                .zip(urls)
                .collect();
            output::print_upload(*folder, &uploaded);
        }
        Command::Delete { urls } => {
            let client = upload_client(&cli, &media_config)?;
            let session = session(&cli, &media_config);
            for url in urls {
                let deleted = client.delete(&session, url).await;
                output::print_delete(url, deleted);
            }
        }
        Command::CdnUrl {
            url,
            width,
            quality,
            format,
        } => {
            let mut options = media_config.cdn_options(*width);
            if let Some(q) = quality {
                options.quality = *q;
            }
            if let Some(f) = format {
                options.format = f.clone();
            }
            println!("{}", media_config.storage().cdn_optimized_url(url, &options));
        }
        Command::GenConfig => {}
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_media=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of CPU cores; config can lower it, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn upload_client(
    cli: &Cli,
    media_config: &MediaConfig,
) -> Result<UploadClient<ReqwestTransport>, Box<dyn std::error::Error>> {
    let base_url = cli
        .api_url
        .clone()
        .unwrap_or_else(|| media_config.api.base_url.clone());
    Ok(
        UploadClient::new(ReqwestTransport::new()?, base_url, media_config.storage())
            .with_strategy(media_config.upload.strategy),
    )
}

fn session(cli: &Cli, media_config: &MediaConfig) -> Session {
    let tenant = cli
        .tenant
        .clone()
        .unwrap_or_else(|| media_config.api.tenant_id.clone());
    Session::new(cli.token.clone(), tenant)
}

/// Compress the images, pass videos through, keep input order.
fn prepare_for_upload(
    files: Vec<MediaFile>,
    options: &storefront_media::imaging::CompressOptions,
) -> Result<Vec<MediaFile>, Box<dyn std::error::Error>> {
    let (images, videos): (Vec<_>, Vec<_>) = files
        .into_iter()
        .enumerate()
        .partition(|(_, f)| !f.is_video());

    let image_files: Vec<MediaFile> = images.iter().map(|(_, f)| f.clone()).collect();
    let compressed = compress_many(&RustBackend::new(), &image_files, options)?;

    let mut ordered: Vec<(usize, MediaFile)> = images
        .into_iter()
        .zip(compressed)
        .map(|((i, _), c)| (i, c.file))
        .chain(videos)
        .collect();
    ordered.sort_by_key(|(i, _)| *i);
    Ok(ordered.into_iter().map(|(_, f)| f).collect())
}

/// Read every named file, then every recognized media file under `--dir`
/// in path order.
fn read_inputs(input: &InputArgs) -> Result<Vec<MediaFile>, Box<dyn std::error::Error>> {
    let mut paths = input.files.clone();
    if let Some(dir) = &input.dir {
        let mut found: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_media_path(e.path()))
            .map(|e| e.into_path())
            .collect();
        found.sort();
        paths.extend(found);
    }
    if paths.is_empty() {
        return Err("no input files (pass paths or --dir)".into());
    }
    Ok(paths
        .iter()
        .map(|p| MediaFile::read(p))
        .collect::<Result<Vec<_>, _>>()?)
}

fn is_media_path(path: &Path) -> bool {
    mime_for_path(path) != "application/octet-stream"
}
