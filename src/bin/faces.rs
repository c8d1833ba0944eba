use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use clap::Parser;
use futures::future::join_all;

const FACE_URL: &str = "https://thispersondoesnotexist.com";

/// Download AI-generated face images into an artifacts directory.
#[derive(Parser)]
#[command(name = "faces")]
struct Args {
    /// How many images to download.
    count: usize,
    /// Where to store the downloaded files.
    #[arg(long, default_value = "artifacts")]
    out_dir: PathBuf,
}

async fn download_face(
    client: reqwest::Client,
    index: usize,
    dir: PathBuf,
) -> anyhow::Result<PathBuf> {
    let response = client.get(FACE_URL).send().await?;
    if !response.status().is_success() {
        anyhow::bail!("image {}: server answered {}", index, response.status());
    }
    let content: Bytes = response.bytes().await?;
    let path = dir.join(format!("ai_face_{}.jpg", index));
    tokio::fs::write(&path, &content).await?;
    println!("downloaded image {}: {} bytes", index, content.len());
    Ok(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    if args.count == 0 {
        anyhow::bail!("count must be positive");
    }

    tokio::fs::create_dir_all(&args.out_dir).await?;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let mut tasks = Vec::with_capacity(args.count);
    for index in 1..=args.count {
        // Pace the launches so the generator serves distinct images.
        tokio::time::sleep(Duration::from_secs(1)).await;
        tasks.push(tokio::spawn(download_face(
            client.clone(),
            index,
            args.out_dir.clone(),
        )));
    }

    let mut downloaded = 0usize;
    for result in join_all(tasks).await {
        match result {
            Ok(Ok(_)) => downloaded += 1,
            Ok(Err(e)) => log::error!("download failed: {:#}", e),
            Err(e) => log::error!("download task failed: {}", e),
        }
    }

    println!(
        "downloaded {} of {} images into {}",
        downloaded,
        args.count,
        args.out_dir.display()
    );
    Ok(())
}
