use anyhow::{Context, Result};
use clap::Parser;
use defect_inspect::{cli, config, error, report, scanner, simulator, InferenceClient};
use defect_inspect_common::{catalog, BatchResponse, Detection, DetectionResult, PredictionResponse};
use cli::{Cli, Commands};
use config::{Config, MAX_BATCH_SIZE};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use scanner::MediaFile;
use simulator::{CaptureStream, Monitor, SimulatedEvent};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("設定ファイルの読み込みに失敗")?;
    let view = cli.command.view();

    println!("🔍 defect-inspect - {}\n", view.title());

    match cli.command {
        Commands::Health => {
            let client = build_client(&config, &cli)?;
            let health = client.health_check().await?;
            println!("✔ {}: {}", client.base_url(), health.status);
            println!("  モデル: {}", if health.model_loaded { "読み込み済み" } else { "未読み込み" });
        }

        Commands::ModelInfo => {
            let client = build_client(&config, &cli)?;
            let info = client.model_info().await?;
            println!("モデル情報:");
            println!("  パス: {}", info.model_path);
            println!("  読み込み: {}", if info.model_loaded { "済み" } else { "未" });
            println!("  クラス数: {}", info.num_classes);
            for class in &info.defect_classes {
                println!("    - {}", class);
            }
        }

        Commands::Detect { ref file, ref output, ref annotated } => {
            let client = build_client(&config, &cli)?;

            println!("[1/2] ファイルを読み込み中...");
            let media = MediaFile::open(file.as_deref()).await?;
            println!("✔ {} ({}, {} bytes)\n", media.file_name, media.mime_type, media.bytes.len());

            println!("[2/2] AI解析中...");
            let spinner = spinner(&format!("{} を解析中", media.file_name));
            let result = client.predict_defects(&media).await;
            spinner.finish_and_clear();
            let response = result?;
            println!("✔ 解析完了\n");

            print_prediction(&response, cli.verbose);

            if let Some(path) = output {
                report::write_json(path, &response)?;
                println!("✔ 結果を保存: {}", path.display());
            }

            let annotated_path = annotated.clone().or_else(|| {
                config
                    .save_annotated
                    .then(|| file.as_deref().map(default_annotated_path))
                    .flatten()
            });
            if let Some(path) = annotated_path {
                if response.image_base64.is_empty() {
                    eprintln!("⚠ 注釈付き画像がレスポンスに含まれていません");
                } else {
                    let written = report::save_annotated_image(&response, &path)?;
                    println!("✔ 注釈付き画像を保存: {}", written.display());
                }
            }

            println!("\n✅ 完了");
        }

        Commands::Batch { ref folder, batch_size, ref output, recursive } => {
            let client = build_client(&config, &cli)?;
            let batch_size = batch_size.unwrap_or_else(|| config.batch_size());
            if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
                return Err(error::InspectError::BatchTooLarge { count: batch_size, max: MAX_BATCH_SIZE }.into());
            }

            println!("[1/3] 画像をスキャン中...");
            let paths = scanner::scan_folder(folder, recursive)?;
            println!("✔ {}枚の画像を検出\n", paths.len());
            if paths.is_empty() {
                println!("解析する画像がありません");
                return Ok(());
            }

            println!("[2/3] AI解析中...");
            let response = run_batches(&client, &paths, batch_size, cli.verbose).await?;
            println!("✔ 解析完了\n");

            println!("[3/3] 集計中...");
            print_batch(&response);

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&response)?;
                std::fs::write(path, json)
                    .with_context(|| format!("結果の保存に失敗: {}", path.display()))?;
                println!("✔ 結果を保存: {}", path.display());
            }

            println!("\n✅ 完了");
        }

        Commands::TestImages { ref defect_type, category, remote, ref fetch, random, ref output, analyze } => {
            let fetch = if random {
                let picked = catalog::pick(rand::random::<f64>());
                println!("🎲 {} ({})", picked.name, picked.filename);
                Some(picked.filename.to_string())
            } else {
                fetch.clone()
            };

            if remote {
                let client = build_client(&config, &cli)?;
                let images = client.list_test_images().await?;
                println!("バックエンドのテスト画像: {}件", images.len());
                for img in &images {
                    println!("  {:<28} {:<16} {}", img.filename, img.defect_type, img.url);
                }
            } else if fetch.is_none() {
                let images = catalog::by_defect_type(defect_type);
                let images: Vec<_> = images
                    .into_iter()
                    .filter(|img| category.map_or(true, |c| img.category == c))
                    .collect();
                println!("テスト画像: {}件（クラス: {}）", images.len(), catalog::defect_types().join(", "));
                for img in images {
                    println!("  {:<12} {:<24} {:<28} {}", img.id, img.name, img.filename, img.description);
                }
            }

            if let Some(name) = fetch.as_deref() {
                let client = build_client(&config, &cli)?;
                if let Some(img) = catalog::find(name) {
                    println!("  {}: {}", img.name, img.description);
                }
                println!("- {} を取得中...", client.test_image_url(name));
                let bytes = client.fetch_test_image(name).await?;

                let dir = output.clone().unwrap_or_else(|| PathBuf::from("."));
                std::fs::create_dir_all(&dir)?;
                let path = dir.join(name);
                std::fs::write(&path, &bytes)?;
                println!("✔ 保存: {} ({} bytes)", path.display(), bytes.len());

                if analyze {
                    let media = MediaFile::from_bytes(name, "image/jpeg", bytes);
                    let response = client.predict_defects(&media).await?;
                    print_prediction(&response, cli.verbose);
                }
            }
        }

        Commands::Monitor { duration, seed, ref source } => {
            run_monitor(duration.map(Duration::from_secs), seed, source, cli.verbose).await?;
        }

        Commands::Config { ref set_api_url, set_batch_size, save_annotated, show } => {
            let mut config = config;
            let mut changed = false;

            if let Some(url) = set_api_url {
                config.set_api_base_url(url)?;
                changed = true;
                println!("✔ ベースURLを設定しました");
            }

            if let Some(size) = set_batch_size {
                config.set_batch_size(size)?;
                changed = true;
                println!("✔ バッチサイズを設定しました");
            }

            if let Some(flag) = save_annotated {
                config.save_annotated = flag;
                changed = true;
                println!("✔ 注釈付き画像の保存設定を変更しました");
            }

            if changed {
                config.save()?;
            }

            if show || !changed {
                println!("設定:");
                println!("  ファイル: {}", Config::config_path()?.display());
                println!("  ベースURL: {}", config.resolve_base_url(cli.api_url.as_deref())?);
                println!("  バッチサイズ: {}", config.batch_size());
                println!("  注釈付き画像の保存: {}", if config.save_annotated { "する" } else { "しない" });
            }
        }
    }

    Ok(())
}

fn build_client(config: &Config, cli: &Cli) -> error::Result<InferenceClient> {
    let client = InferenceClient::from_config(config, cli.api_url.as_deref())?.with_verbose(cli.verbose);
    if cli.verbose {
        println!("  バックエンド: {}", client.base_url());
    }
    Ok(client)
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn default_annotated_path(file: &Path) -> PathBuf {
    let stem = file.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    file.with_file_name(format!("{}_annotated", stem))
}

fn print_prediction(response: &PredictionResponse, verbose: bool) {
    if !response.is_consistent() && verbose {
        eprintln!(
            "⚠ total_defects ({}) と検出件数 ({}) が一致しません",
            response.total_defects,
            response.detections.len()
        );
    }

    if response.detections.is_empty() {
        println!("欠陥は検出されませんでした");
        return;
    }

    println!("検出結果: {}件", response.detections.len());
    for d in &response.detections {
        print_detection_row(d, verbose);
    }

    let s = report::summarize(&response.detections);
    println!(
        "\n重大度: high {} / medium {} / low {}  処置: Reject {} / Review {} / Accept {}",
        s.high, s.medium, s.low, s.reject, s.review, s.accept
    );
}

fn print_detection_row(d: &DetectionResult, verbose: bool) {
    println!(
        "  #{:<3} {:<16} {:>5.1}%  {:<6} {:<6}  area={}",
        d.id, d.kind, d.confidence, d.severity, d.action, d.area
    );
    if verbose {
        println!("        bbox=[{:.1}, {:.1}, {:.1}, {:.1}]", d.bbox[0], d.bbox[1], d.bbox[2], d.bbox[3]);
    }
}

async fn run_batches(
    client: &InferenceClient,
    paths: &[PathBuf],
    batch_size: usize,
    verbose: bool,
) -> error::Result<BatchResponse> {
    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("  [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let mut results = Vec::new();
    for (batch_idx, chunk) in paths.chunks(batch_size).enumerate() {
        if verbose {
            pb.println(format!("  バッチ {}: {}枚", batch_idx + 1, chunk.len()));
        }

        let mut files = Vec::with_capacity(chunk.len());
        for path in chunk {
            files.push(MediaFile::open(Some(path.as_path())).await?);
        }

        pb.set_message(format!("バッチ {}", batch_idx + 1));
        let response = match client.batch_predict(&files).await {
            Ok(r) => r,
            Err(e) => {
                pb.abandon();
                return Err(e);
            }
        };
        results.extend(response.results);
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    Ok(BatchResponse { results })
}

fn print_batch(response: &BatchResponse) {
    let items = response.items();
    let total: u32 = items.iter().map(|i| i.total_defects).sum();
    println!("✔ {}件中 欠陥 {}件", response.results.len(), total);

    for item in &items {
        match &item.error {
            Some(err) => println!("  {:<28} エラー: {}", item.filename, err),
            None => {
                let kinds: Vec<&str> = item.detections.iter().map(|d| d.kind.as_str()).collect();
                println!("  {:<28} {}件 {}", item.filename, item.total_defects, kinds.join(", "));
            }
        }
    }
}

async fn run_monitor(duration: Option<Duration>, seed: Option<u64>, source: &str, verbose: bool) -> Result<()> {
    let rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<SimulatedEvent>();
    let mut monitor = Monitor::new(rng).with_subscriber(tx);

    let capture = CaptureStream::open(source);
    println!(
        "▶ 監視開始: {} ({}x{} @{}fps){}",
        capture.source(),
        capture.width,
        capture.height,
        capture.fps,
        match duration {
            Some(d) => format!(" / {}秒", d.as_secs()),
            None => " / Ctrl-Cで停止".to_string(),
        }
    );
    monitor.start(capture).await;

    let deadline = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = &mut ctrl_c => break,
            Some(event) = rx.recv() => {
                let stats = monitor.stats();
                print_live_event(&event.detection, event.processing_ms, verbose);
                println!(
                    "           検査 {} / 欠陥 {} / 合格率 {:.1}%",
                    stats.items_scanned, stats.defects_found, stats.pass_rate
                );
            }
        }
    }

    monitor.stop().await;

    let feed = monitor.snapshot();
    let stats = feed.stats();
    println!("\n■ 監視停止");
    println!("  検査数: {}", stats.items_scanned);
    println!("  欠陥数: {}", stats.defects_found);
    println!("  合格率: {:.1}%", stats.pass_rate);
    if verbose {
        println!("  直近ログ ({}件):", feed.len());
        for d in feed.detections() {
            print_live_event(d, feed.processing_ms(), false);
        }
    }

    println!("\n✅ 完了");
    Ok(())
}

fn print_live_event(d: &Detection, processing_ms: f64, verbose: bool) {
    let mark = if d.is_defect() { "✖" } else { "✔" };
    let severity = d.severity().map(|s| format!(" [{}]", s)).unwrap_or_default();
    println!("  {} {} {:<16} {:>5.1}%{}", mark, d.time, d.kind, d.confidence, severity);
    if verbose {
        println!("           id={} 処理時間 {:.1}ms", d.id, processing_ms);
    }
}
