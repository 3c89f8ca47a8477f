//! `aerobrain ingest`: Index a folder of documents for one tenant.

use aerobrain_core::retrieval::{TenantId, VectorStore};
use aerobrain_store::{IngestOptions, IngestReport, ingest_markdown_dir, ingest_pdf_dir};
use std::path::PathBuf;
use tracing::info;

pub struct IngestArgs {
    pub dir: PathBuf,
    pub tenant: i64,
    pub aircraft: Option<String>,
    pub ata: Option<String>,
    pub doc_type: String,
    pub markdown: bool,
}

pub async fn run(args: IngestArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    if !config.has_api_key() {
        return Err("Ingestion needs an embedding API key. Set OPENAI_API_KEY or AEROBRAIN_API_KEY.".into());
    }

    let store = aerobrain_gateway::open_vector_store(&config).await?;
    let tenant = TenantId(args.tenant);

    println!("📚 Ingesting {} for tenant {tenant}", args.dir.display());

    let report = if args.markdown {
        ingest_markdown_dir(store.as_ref(), &args.dir, tenant, args.aircraft.as_deref()).await?
    } else {
        let options = IngestOptions {
            tenant_id: tenant,
            aircraft_model: args.aircraft,
            ata_chapter: args.ata,
            doc_type: args.doc_type,
        };
        ingest_pdf_dir(store.as_ref(), &args.dir, &options).await?
    };

    info!(tenant = %tenant, files = report.ingested.len(), chunks = report.chunks, "Ingestion complete");
    print_report(&report);
    println!("   Tenant now has {} indexed chunks", store.count(tenant).await?);

    Ok(())
}

fn print_report(report: &IngestReport) {
    for path in &report.ingested {
        println!("  ✅ {}", path.display());
    }
    for (path, reason) in &report.skipped {
        println!("  ⏭️  {} ({reason})", path.display());
    }
    println!(
        "   {} file(s) ingested, {} skipped, {} chunk(s) written",
        report.ingested.len(),
        report.skipped.len(),
        report.chunks
    );
}
