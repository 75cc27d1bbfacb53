//! Subcommand implementations. Each reads through the context cache.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context as _, Result};
use clap::Args;

use wahlcache_core::cache::{BetriebeData, StatusData};
use wahlcache_core::dashboard::{self, DashboardFilter, PLACEHOLDER};
use wahlcache_core::models::{Context, StatusRecord, StickerEntry};
use wahlcache_core::qr::{QrForm, QrPayload};
use wahlcache_core::stickers::{png_data_uri, sheet_layout, AddOutcome, StickerCollection};
use wahlcache_core::upload::{upload_batch, DocumentType, UploadBatch, UploadFile};
use wahlcache_core::utils::{or_placeholder, truncate_chars};
use wahlcache_core::{Config, ContextCache};

/// Background refresh interval for `status --watch`
const STATUS_REFRESH_SECS: u64 = 30;

/// Organization names are cut to this width in listings
const NAME_WIDTH: usize = 40;

fn require_context(cache: &ContextCache) -> Result<Context> {
    cache
        .get_context()
        .ok_or_else(|| anyhow!("No election selected. Run `wahlcache select <id>` first."))
}

// ===== Elections and context =====

pub async fn elections(cache: &ContextCache) -> Result<()> {
    let elections = cache
        .list_elections()
        .await
        .context("Backend unreachable: could not load /api/wahlen")?;
    let active = cache.get_context().map(|c| c.election_id);

    if elections.is_empty() {
        println!("No elections available.");
    }
    for election in elections {
        let marker = if active.as_deref() == Some(election.id.as_str()) { "*" } else { " " };
        println!("{} {:<12} {}", marker, election.id, election.display_name());
    }
    Ok(())
}

pub async fn select(cache: &ContextCache, election_id: &str) -> Result<()> {
    let elections = cache
        .list_elections()
        .await
        .context("Backend unreachable: could not load /api/wahlen")?;
    let election = elections
        .iter()
        .find(|e| e.id == election_id.trim())
        .ok_or_else(|| anyhow!("Unknown election: {}", election_id))?;

    cache.select_election(election)?;
    println!("Active: {} ({})", election.display_name(), election.id);

    let report = cache.preload(&election.id).await;
    let availability = if report.status.is_empty() {
        "no status data"
    } else if dashboard::has_any_files(&report.status) {
        "available"
    } else {
        "no files yet"
    };
    println!(
        "Loaded {} locations, {} organizations | Dashboard: {}",
        report.status.len(),
        report.betriebe.len(),
        availability
    );
    Ok(())
}

pub fn context(cache: &ContextCache) -> Result<()> {
    match cache.get_context() {
        Some(ctx) => {
            println!("Active: {} ({})", ctx.election_name, ctx.election_id);
            let status_age = cache.entry_age::<StatusData>(&ctx.election_id);
            let betriebe_age = cache.entry_age::<BetriebeData>(&ctx.election_id);
            println!("Status updated: {}", status_age.as_deref().unwrap_or("never"));
            println!("Reference data updated: {}", betriebe_age.as_deref().unwrap_or("never"));
        }
        None => println!("No election selected. Run `wahlcache select <id>`."),
    }
    Ok(())
}

pub async fn preload(cache: &ContextCache) -> Result<()> {
    let ctx = require_context(cache)?;
    let report = cache.preload(&ctx.election_id).await;
    println!(
        "Status: {} locations, reference data: {} organizations",
        report.status.len(),
        report.betriebe.len()
    );
    Ok(())
}

// ===== Dashboard =====

pub async fn status(cache: &ContextCache, filter: &DashboardFilter, refresh: bool, watch: bool) -> Result<()> {
    let ctx = require_context(cache)?;

    if !watch {
        let records = if refresh {
            cache.force_refresh::<StatusData>(&ctx.election_id).await
        } else {
            cache.get::<StatusData>(&ctx.election_id).await
        };
        return render_status(cache, &ctx, &records, filter).await;
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(STATUS_REFRESH_SECS));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let records = cache.force_refresh::<StatusData>(&ctx.election_id).await;
                render_status(cache, &ctx, &records, filter).await?;
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

async fn render_status(
    cache: &ContextCache,
    ctx: &Context,
    records: &[StatusRecord],
    filter: &DashboardFilter,
) -> Result<()> {
    let betriebe = cache.get::<BetriebeData>(&ctx.election_id).await;
    let age = cache.entry_age::<StatusData>(&ctx.election_id);

    println!(
        "Status - {} ({}) | updated {}",
        ctx.election_name,
        ctx.election_id,
        age.as_deref().unwrap_or("never")
    );
    if records.is_empty() {
        println!("No status data available.");
        return Ok(());
    }

    let summary = dashboard::traffic_light_summary(records);
    println!(
        "green {} | yellow {} | red {} | districts: {}",
        summary.green,
        summary.yellow,
        summary.red,
        dashboard::district_options(records).join(", ")
    );

    let groups = dashboard::build_dashboard(records, &betriebe, filter);
    if groups.is_empty() {
        println!("No locations match the filter.");
    }
    for group in groups {
        println!();
        println!("{}", group.label());
        for row in group.rows {
            println!(
                "  {} {:<8} {:<width$} {} files",
                row.traffic_light.symbol(),
                row.location_code,
                truncate_chars(&row.organization_name, NAME_WIDTH),
                row.file_count,
                width = NAME_WIDTH
            );
        }
    }
    Ok(())
}

pub async fn betriebe(cache: &ContextCache) -> Result<()> {
    let list = cache.get::<BetriebeData>(&cache.reference_scope()).await;
    if list.is_empty() {
        println!("No reference data available.");
    }
    for b in list {
        println!(
            "{:<8} {:<width$} {}",
            b.location_code,
            truncate_chars(or_placeholder(&b.organization_name, PLACEHOLDER), NAME_WIDTH),
            b.district.as_deref().unwrap_or(PLACEHOLDER),
            width = NAME_WIDTH
        );
    }
    Ok(())
}

// ===== Files and uploads =====

pub async fn files(cache: &ContextCache, district: &str, location_code: &str) -> Result<()> {
    let files = cache
        .source()
        .fetch_files(district, location_code)
        .await
        .context("Could not load stored files")?;
    if files.is_empty() {
        println!("No files stored.");
    }
    for f in files {
        println!("{}  ({})", f.name, f.modified_display());
    }
    Ok(())
}

pub struct UploadPaths {
    pub wahlausschreiben: Vec<PathBuf>,
    pub niederschrift: Vec<PathBuf>,
    pub wahlvorschlag: Vec<PathBuf>,
}

fn read_upload_file(path: &Path) -> Result<UploadFile> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("Not a file: {}", path.display()))?;
    Ok(UploadFile::new(name, bytes))
}

pub async fn upload(cache: &ContextCache, district: &str, location_code: &str, paths: UploadPaths) -> Result<()> {
    let mut batch = UploadBatch::new(district, location_code);
    let groups = [
        (DocumentType::Wahlausschreiben, paths.wahlausschreiben),
        (DocumentType::Niederschrift, paths.niederschrift),
        (DocumentType::Wahlvorschlag, paths.wahlvorschlag),
    ];
    for (document_type, files) in groups {
        for path in files {
            let file = read_upload_file(&path)?;
            println!("{}: {} ({}) ready", document_type, file.file_name, file.size_display());
            batch.add(document_type, file);
        }
    }
    if batch.is_empty() {
        bail!("No files given. Use --wahlausschreiben, --niederschrift or --wahlvorschlag.");
    }

    let report = upload_batch(cache.source(), &batch).await;
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(()) => println!("  ok   {} ({})", outcome.file_name, outcome.document_type),
            Err(e) => println!("  fail {} ({}): {}", outcome.file_name, outcome.document_type, e),
        }
    }
    println!("{}", report.summary());

    if !report.all_succeeded() {
        bail!(report.summary());
    }
    Ok(())
}

// ===== QR and stickers =====

#[derive(Args)]
pub struct QrArgs {
    location_code: String,
    #[arg(long)]
    betrieb: Option<String>,
    #[arg(long)]
    vorsitz: Option<String>,
    #[arg(long)]
    anschrift: Option<String>,
    #[arg(long)]
    email: Option<String>,
}

async fn build_form(cache: &ContextCache, location_code: &str, organization: Option<String>) -> QrForm {
    let mut form = QrForm {
        election_id: cache.get_context().map(|c| c.election_id).unwrap_or_default(),
        location_code: location_code.trim().to_string(),
        organization_name: organization.unwrap_or_default(),
        ..Default::default()
    };
    let betriebe = cache.get::<BetriebeData>(&cache.reference_scope()).await;
    form.autofill(&betriebe);
    form
}

pub async fn qr(cache: &ContextCache, config: &Config, args: QrArgs) -> Result<()> {
    let mut form = build_form(cache, &args.location_code, args.betrieb).await;
    form.chairperson = args.vorsitz.unwrap_or_default();
    if let Some(address) = args.anschrift {
        form.address = address;
    }
    form.email = args.email.unwrap_or_default();

    let payload = form.to_payload();
    let url = payload.target_url(config.qr_target_url())?;
    println!("Organization: {}", payload.n);
    println!("Address:      {}", payload.a);
    println!("URL:          {}", url);
    println!("Sticker file: {}", form.sticker_file_name());
    Ok(())
}

pub fn qr_decode(input: &str) -> Result<()> {
    let payload = QrPayload::from_url_or_token(input)?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn collection(cache: &ContextCache) -> StickerCollection {
    let election = cache.get_context().map(|c| c.election_id).unwrap_or_default();
    StickerCollection::load(cache.store(), &election)
}

pub fn stickers_list(cache: &ContextCache) -> Result<()> {
    let collection = collection(cache);
    if collection.is_empty() {
        println!("No stickers collected yet.");
    }
    for (i, entry) in collection.entries().iter().enumerate() {
        let bkz = if entry.location_code.is_empty() {
            "no BKZ".to_string()
        } else {
            format!("BKZ {}", entry.location_code)
        };
        println!("{:>3}. {:<10} {}", i + 1, bkz, truncate_chars(&entry.organization_name, NAME_WIDTH));
    }
    Ok(())
}

pub async fn stickers_add(cache: &ContextCache, location_code: &str, image: &Path, organization: Option<String>) -> Result<()> {
    let png = std::fs::read(image).with_context(|| format!("Failed to read {}", image.display()))?;
    let payload = build_form(cache, location_code, organization).await.to_payload();

    let mut collection = collection(cache);
    let entry = StickerEntry::new(payload.w, payload.b, payload.n, png_data_uri(&png));
    match collection.add(entry)? {
        AddOutcome::Added => println!("Added to collection ({} stickers)", collection.len()),
        AddOutcome::Duplicate => println!("Already in the collection"),
    }
    Ok(())
}

pub fn stickers_remove(cache: &ContextCache, position: usize) -> Result<()> {
    let mut collection = collection(cache);
    let removed = position
        .checked_sub(1)
        .map(|index| collection.remove(index))
        .transpose()?
        .flatten();
    match removed {
        Some(entry) => println!("Removed BKZ {} ({})", entry.location_code, entry.organization_name),
        None => bail!("No sticker at position {}", position),
    }
    Ok(())
}

pub fn stickers_clear(cache: &ContextCache) -> Result<()> {
    let mut collection = collection(cache);
    let count = collection.len();
    collection.clear()?;
    println!("Removed {} stickers", count);
    Ok(())
}

pub fn stickers_layout(cache: &ContextCache) -> Result<()> {
    let collection = collection(cache);
    if collection.is_empty() {
        bail!("Collection is empty");
    }
    let pages = sheet_layout(collection.len());
    println!("{} -> {} page(s)", collection.sheet_file_name(), pages.len());

    let mut entries = collection.entries().iter();
    for (page_no, slots) in pages.iter().enumerate() {
        println!("Page {}", page_no + 1);
        for slot in slots {
            if let Some(entry) = entries.next() {
                println!(
                    "  x={:>6.1}mm y={:>6.1}mm {}x{}mm  BKZ {}",
                    slot.x_mm, slot.y_mm, slot.width_mm, slot.height_mm, entry.location_code
                );
            }
        }
    }
    Ok(())
}
