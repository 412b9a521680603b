//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::Backend;
use crate::api::{self, AppState};
use crate::config::ServerConfig;
use crate::media::media_host_for;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use storefront_core::{
    BulkCategory, Catalog, CatalogSnapshot, CategoryId, CategoryNode, StoreError,
    formats::{MAX_SNAPSHOT_SIZE, checksum, crypto_hash},
};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for category bulk imports (50 MB).
const MAX_CATEGORY_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Maximum file size for snapshot imports and file-backend databases.
const MAX_IMPORT_FILE_SIZE: u64 = MAX_SNAPSHOT_SIZE as u64;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), StoreError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| StoreError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(StoreError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// Canonicalizes the path (resolving symlinks and "..") and requires a
/// regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, StoreError> {
    let canonical = path.canonicalize().map_err(|e| {
        StoreError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(StoreError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output file path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, StoreError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        StoreError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(StoreError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| StoreError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    backend: Backend,
    config_path: Option<&Path>,
    host: &str,
    port: u16,
) -> Result<(), StoreError> {
    let config = ServerConfig::load(config_path)?;
    let catalog = load_catalog(db_path, backend)?;
    let media = media_host_for(config.media_dir.as_deref());

    println!("Storefront Catalog Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", host);
    println!("  Port:       {}", port);
    println!("  Backend:    {}", backend);
    println!("  Database:   {:?}", db_path);
    println!("  Rate limit: {} req/s", config.rate_limit);
    println!("  Admin auth: {}", if config.has_auth() { "on" } else { "OFF" });
    println!();
    println!("Endpoints:");
    println!("  GET  /categories          - List categories");
    println!("  GET  /categories/tree     - Category tree");
    println!("  GET  /categories/{{id}}/descendants");
    println!("  GET  /products            - List products");
    println!("  POST /categories          - Create category (admin)");
    println!("  POST /export              - Export catalog (admin)");
    println!("  GET  /health              - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let mut state = AppState::new(catalog).with_media(media).with_config(config);
    if backend == Backend::File {
        state = state.with_snapshot_file(db_path.to_path_buf());
    }

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show catalog status.
pub fn cmd_status(db_path: &Path, backend: Backend, json_mode: bool) -> Result<(), StoreError> {
    let catalog = load_catalog(db_path, backend)?;
    let stats = catalog.stats()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "backend": backend.to_string(),
            "category_count": stats.category_count,
            "root_count": stats.root_count,
            "max_depth": stats.max_depth,
            "product_count": stats.product_count,
            "active_product_count": stats.active_product_count,
            "total_stock": stats.total_stock,
            "integrity_issues": stats.integrity_issues
        }));
        return Ok(());
    }

    println!("Storefront Catalog Status");
    println!("=========================");
    println!("Database: {:?}", db_path);
    println!("Backend:  {}", backend);
    println!();
    println!("Categories:       {}", stats.category_count);
    println!("Root categories:  {}", stats.root_count);
    println!("Max depth:        {}", stats.max_depth);
    println!("Products:         {}", stats.product_count);
    println!("Active products:  {}", stats.active_product_count);
    println!("Total stock:      {}", stats.total_stock);
    println!("Integrity issues: {}", stats.integrity_issues);

    Ok(())
}

// =============================================================================
// TREE COMMAND
// =============================================================================

/// Indented outline of a forest, one category per line.
fn render_tree(forest: &[CategoryNode]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut stack: Vec<(&CategoryNode, usize)> = forest.iter().rev().map(|n| (n, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        let category = &node.category;
        lines.push(format!(
            "{}- {} ({}) [{}]{}",
            "  ".repeat(depth),
            category.name,
            category.slug,
            category.id,
            if category.is_active { "" } else { " inactive" }
        ));
        stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
    }
    lines
}

/// Print the category tree.
pub fn cmd_tree(db_path: &Path, backend: Backend, json_mode: bool) -> Result<(), StoreError> {
    let catalog = load_catalog(db_path, backend)?;
    let (forest, report) = catalog.category_tree()?;

    if !report.is_complete() {
        tracing::warn!(
            event = "category_tree_incomplete",
            excluded = ?report.excluded,
            "{} categories excluded from the tree (run `storefront audit`)",
            report.excluded.len()
        );
    }

    if json_mode {
        print_json(&serde_json::json!({
            "tree": forest,
            "excluded": report.excluded,
        }));
        return Ok(());
    }

    if forest.is_empty() {
        println!("No categories");
    }
    for line in render_tree(&forest) {
        println!("{}", line);
    }
    Ok(())
}

// =============================================================================
// AUDIT COMMAND
// =============================================================================

/// Report category data-integrity issues.
pub fn cmd_audit(db_path: &Path, backend: Backend, json_mode: bool) -> Result<(), StoreError> {
    let catalog = load_catalog(db_path, backend)?;
    let report = catalog.audit_categories()?;

    if json_mode {
        print_json(&report);
        return Ok(());
    }

    if report.is_clean() {
        println!("Category hierarchy is clean");
        return Ok(());
    }

    println!("Category audit: {} issue(s)", report.issue_count());
    for dangling in &report.dangling {
        println!(
            "  dangling parent: {} -> {} (missing)",
            dangling.id, dangling.parent
        );
    }
    if !report.cycles.is_empty() {
        println!("  cycle members:   {}", join_ids(&report.cycles));
    }
    if !report.detached.is_empty() {
        println!("  detached:        {}", join_ids(&report.detached));
    }
    if !report.duplicate_ids.is_empty() {
        println!("  duplicate ids:   {}", join_ids(&report.duplicate_ids));
    }
    Ok(())
}

fn join_ids<'a>(ids: impl IntoIterator<Item = &'a CategoryId>) -> String {
    ids.into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// DESCENDANTS COMMAND
// =============================================================================

/// List a category and all its descendants.
pub fn cmd_descendants(
    db_path: &Path,
    backend: Backend,
    json_mode: bool,
    id: u64,
) -> Result<(), StoreError> {
    let catalog = load_catalog(db_path, backend)?;
    let ids = catalog.category_descendants(CategoryId(id))?;

    if json_mode {
        print_json(&serde_json::json!({
            "category": id,
            "descendants": ids,
        }));
        return Ok(());
    }

    println!("Category {} and its descendants ({}):", id, ids.len());
    println!("  {}", join_ids(&ids));
    Ok(())
}

// =============================================================================
// IMPORT CATEGORIES COMMAND
// =============================================================================

/// Accepted shapes of a category bulk file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CategoryFile {
    Wrapped { categories: Vec<BulkCategory> },
    List(Vec<BulkCategory>),
}

impl CategoryFile {
    fn into_rows(self) -> Vec<BulkCategory> {
        match self {
            Self::Wrapped { categories } => categories,
            Self::List(rows) => rows,
        }
    }
}

/// Bulk-create categories from a JSON file.
pub fn cmd_import_categories(
    db_path: &Path,
    backend: Backend,
    json_mode: bool,
    file: &Path,
) -> Result<(), StoreError> {
    tracing::info!("Importing categories from {:?}", file);

    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_CATEGORY_FILE_SIZE)?;

    let contents = std::fs::read(&validated_path)
        .map_err(|e| StoreError::IoError(format!("Read file: {}", e)))?;
    let rows = serde_json::from_slice::<CategoryFile>(&contents)
        .map_err(|e| StoreError::DeserializationError(format!("Invalid category file: {}", e)))?
        .into_rows();

    let mut catalog = load_catalog(db_path, backend)?;
    let outcome = catalog.bulk_upload_categories(rows)?;
    save_catalog(&catalog, db_path)?;

    if json_mode {
        print_json(&outcome);
        return Ok(());
    }

    println!(
        "Created {} categories, skipped {} existing",
        outcome.created.len(),
        outcome.skipped.len()
    );
    for slug in &outcome.skipped {
        println!("  skipped: {}", slug);
    }
    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the catalog as a snapshot file.
pub fn cmd_export(db_path: &Path, backend: Backend, output: &Path) -> Result<(), StoreError> {
    let validated_output = validate_output_path(output)?;

    let catalog = load_catalog(db_path, backend)?;
    let data = catalog.snapshot()?.to_bytes()?;

    std::fs::write(&validated_output, &data)
        .map_err(|e| StoreError::IoError(format!("Write file: {}", e)))?;

    println!("Exported {} bytes to {:?}", data.len(), validated_output);
    println!("Checksum: {}", checksum(&data));
    println!("BLAKE3:   {}", crypto_hash(&data));
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Import a snapshot file into an empty catalog.
pub fn cmd_import(db_path: &Path, backend: Backend, input: &Path) -> Result<(), StoreError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_IMPORT_FILE_SIZE)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| StoreError::IoError(format!("Read file: {}", e)))?;
    let snapshot = CatalogSnapshot::from_bytes(&data)?;

    let mut catalog = load_catalog(db_path, backend)?;
    catalog.import_snapshot(snapshot)?;
    save_catalog(&catalog, db_path)?;

    let stats = catalog.stats()?;
    println!(
        "Imported catalog: {} categories, {} products",
        stats.category_count, stats.product_count
    );
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize new database.
pub fn cmd_init(db_path: &Path, backend: Backend, force: bool) -> Result<(), StoreError> {
    if db_path.exists() {
        if !force {
            return Err(StoreError::Conflict(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| StoreError::IoError(format!("Remove existing database: {}", e)))?;
    }

    match backend {
        Backend::Redb => {
            let _catalog = Catalog::with_redb(db_path)?;
            println!("Initialized new redb database at {:?}", db_path);
        }
        Backend::File => {
            save_catalog(&Catalog::new(), db_path)?;
            println!("Initialized new file database at {:?}", db_path);
        }
    }
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the catalog at `db_path` with the given backend.
///
/// A missing file-backend database is an empty catalog.
pub fn load_catalog(db_path: &Path, backend: Backend) -> Result<Catalog, StoreError> {
    match backend {
        Backend::Redb => Catalog::with_redb(db_path),
        Backend::File => {
            if !db_path.exists() {
                return Ok(Catalog::new());
            }
            validate_file_size(db_path, MAX_IMPORT_FILE_SIZE)?;
            let data = std::fs::read(db_path)
                .map_err(|e| StoreError::IoError(format!("Read db: {}", e)))?;
            Catalog::from_snapshot(CatalogSnapshot::from_bytes(&data)?)
        }
    }
}

/// Save a catalog to `db_path`. Disk-backed catalogs are already saved.
pub fn save_catalog(catalog: &Catalog, db_path: &Path) -> Result<(), StoreError> {
    if catalog.is_persistent() {
        return Ok(());
    }
    let data = catalog.snapshot()?.to_bytes()?;
    std::fs::write(db_path, &data).map_err(|e| StoreError::IoError(format!("Write db: {}", e)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::NewCategory;

    #[test]
    fn file_backend_roundtrip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = dir.path().join("catalog.sfct");

        cmd_init(&db, Backend::File, false).expect("init");
        assert!(cmd_init(&db, Backend::File, false).is_err());

        let mut catalog = load_catalog(&db, Backend::File).expect("load");
        catalog
            .create_category(NewCategory::new("Fashion", "fashion"))
            .expect("create");
        save_catalog(&catalog, &db).expect("save");

        let reloaded = load_catalog(&db, Backend::File).expect("reload");
        assert_eq!(reloaded.stats().expect("stats").category_count, 1);
    }

    #[test]
    fn import_categories_accepts_both_shapes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = dir.path().join("catalog.sfct");
        let wrapped = dir.path().join("wrapped.json");
        let bare = dir.path().join("bare.json");
        std::fs::write(
            &wrapped,
            r#"{"categories":[{"name":"Men","slug":"men","parent":"Fashion"}]}"#,
        )
        .expect("write");
        std::fs::write(&bare, r#"[{"name":"Women","slug":"women","parent":"Fashion"}]"#)
            .expect("write");

        cmd_import_categories(&db, Backend::File, true, &wrapped).expect("wrapped");
        cmd_import_categories(&db, Backend::File, true, &bare).expect("bare");

        let catalog = load_catalog(&db, Backend::File).expect("load");
        let (forest, report) = catalog.category_tree().expect("tree");
        assert!(report.is_complete());
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].category.name, "Fashion");
        assert_eq!(forest[0].children.len(), 2);
    }

    #[test]
    fn export_then_import_into_redb() {
        let dir = tempfile::tempdir().expect("temp dir");
        let source = dir.path().join("source.sfct");
        let snapshot = dir.path().join("export.bin");
        let target = dir.path().join("target.redb");

        let mut catalog = Catalog::new();
        let root = catalog
            .create_category(NewCategory::new("Home", "home"))
            .expect("create")
            .id;
        catalog
            .create_category(NewCategory::new("Lamps", "lamps").with_parent(root))
            .expect("create");
        save_catalog(&catalog, &source).expect("save");

        cmd_export(&source, Backend::File, &snapshot).expect("export");
        cmd_import(&target, Backend::Redb, &snapshot).expect("import");

        let imported = load_catalog(&target, Backend::Redb).expect("open");
        assert_eq!(
            imported.snapshot().expect("snapshot"),
            catalog.snapshot().expect("snapshot")
        );
        // A second import would overwrite existing data.
        assert!(cmd_import(&target, Backend::Redb, &snapshot).is_err());
    }

    #[test]
    fn render_tree_indents_children() {
        let mut catalog = Catalog::new();
        let root = catalog
            .create_category(NewCategory::new("Fashion", "fashion"))
            .expect("create")
            .id;
        let mut inactive = NewCategory::new("Men", "men").with_parent(root);
        inactive.is_active = false;
        catalog.create_category(inactive).expect("create");

        let (forest, _) = catalog.category_tree().expect("tree");
        assert_eq!(
            render_tree(&forest),
            vec![
                "- Fashion (fashion) [1]".to_string(),
                "  - Men (men) [2] inactive".to_string(),
            ]
        );
    }

    #[test]
    fn output_path_requires_existing_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        assert!(validate_output_path(&dir.path().join("out.bin")).is_ok());
        assert!(validate_output_path(&dir.path().join("missing/out.bin")).is_err());
        assert!(validate_file_path(dir.path()).is_err());
    }
}
