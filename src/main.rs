use anyhow::{Context, Result};
use postscraper::pipeline::DEFAULT_MEDIA_DIR;
use postscraper::{Pipeline, UploadedFile};
use std::{fs, path::Path};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    info!("startup");

    // ─── 2) read uploads named on the command line ───────────────────
    let paths: Vec<String> = std::env::args().skip(1).collect();
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        let name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.clone());
        let bytes = fs::read(path).with_context(|| format!("reading {path}"))?;
        files.push(UploadedFile { name, bytes });
    }

    // ─── 3) run the batch ────────────────────────────────────────────
    let pipeline = Pipeline::new(DEFAULT_MEDIA_DIR)?;
    match pipeline.process(&files) {
        Ok(post) => {
            info!(post_id = %post.post_id, "ingested");
            println!("{}", serde_json::to_string_pretty(&post)?);
            Ok(())
        }
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    }
}
