use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::process::Command;

use globwalk::GlobWalkerBuilder;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepsResult {
    pub ok: bool,
    pub missing: Vec<String>,
}

/// Check required/optional CLI dependencies.
/// - Required: pdftoppm (Poppler, page rasterization), tesseract (OCR)
/// - Optional: pdfinfo (fast page count)
/// Returns a DepsResult. `ok` is true iff required deps are present.
pub fn check_deps() -> DepsResult {
    let mut missing = Vec::new();

    let has_pdftoppm = which::which("pdftoppm").is_ok();
    if !has_pdftoppm {
        missing.push("pdftoppm".to_string());
    }
    let has_tesseract = which::which("tesseract").is_ok();
    if !has_tesseract {
        missing.push("tesseract".to_string());
    }

    // optional
    if which::which("pdfinfo").is_err() {
        missing.push("pdfinfo".to_string());
    }

    DepsResult { ok: has_pdftoppm && has_tesseract, missing }
}

/// Render apt installation help for missing deps.
pub fn install_help_for(missing: &[String]) -> String {
    let mut pkgs: Vec<&str> = Vec::new();
    if missing.iter().any(|m| m == "pdftoppm" || m == "pdfinfo") {
        pkgs.push("poppler-utils");
    }
    if missing.iter().any(|m| m == "tesseract") {
        pkgs.push("tesseract-ocr");
    }

    if pkgs.is_empty() {
        return String::new();
    }

    format!(
        "Dependency missing. Install via apt:\n  sudo apt install {}",
        pkgs.join(" ")
    )
}

#[derive(Debug, Error)]
pub enum EnumerateError {
    #[error("NoFilesFound")]
    NoFilesFound { guidance: String },
}

/// Enumerate PDFs using a glob pattern (e.g., "./forms/**/*.pdf").
/// Returns a sorted list of paths.
pub fn enumerate_pdfs(glob_pattern: &str) -> Result<Vec<PathBuf>, EnumerateError> {
    let root = if Path::new(glob_pattern).is_absolute() { "/" } else { "." };
    let mut pat = glob_pattern.to_string();
    if pat.starts_with("./") { pat = pat.trim_start_matches("./").to_string(); }
    let mut paths: Vec<PathBuf> = GlobWalkerBuilder::from_patterns(root, &[pat.as_str()])
        .case_insensitive(false)
        .follow_links(false)
        .max_depth(std::usize::MAX)
        .build()
        .map_err(|_| EnumerateError::NoFilesFound { guidance: folder_guidance() })?
        .filter_map(|e| e.ok())
        .map(|e| e.path().to_path_buf())
        .collect();

    paths.sort();
    paths.retain(|p| p.is_file());

    if paths.is_empty() {
        return Err(EnumerateError::NoFilesFound { guidance: folder_guidance() });
    }

    Ok(paths)
}

fn folder_guidance() -> String {
    let guide = r#"No PDFs matched the given pattern.
Suggested layout:
  ./forms/acord-25.pdf
  ./forms/acord-130.pdf
Example: acord2fields "./forms/**/*.pdf""#;
    guide.to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

fn default_dpi() -> u32 { 300 }
fn default_lang() -> String { "eng".to_string() }
fn default_psm() -> u8 { 6 }
fn default_oem() -> u8 { 3 }
fn default_min_label() -> usize { 2 }
fn default_max_label() -> usize { 80 }

fn default_glyphs() -> Vec<String> {
    // OCR renders checkboxes unreliably; treat the glyph set as data, not code.
    ["☐", "□", "▢", "■", "○", "◯", "[ ]", "[]"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_psm")]
    pub psm: u8,
    #[serde(default = "default_oem")]
    pub oem: u8,
    #[serde(default = "default_glyphs")]
    pub checkbox_glyphs: Vec<String>,
    #[serde(default = "default_min_label")]
    pub min_label_len: usize,
    #[serde(default = "default_max_label")]
    pub max_label_len: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            dpi: default_dpi(),
            lang: default_lang(),
            psm: default_psm(),
            oem: default_oem(),
            checkbox_glyphs: default_glyphs(),
            min_label_len: default_min_label(),
            max_label_len: default_max_label(),
        }
    }
}

/// Load and validate an optional YAML config. Every field has a default.
pub fn load_config(path: &Path) -> Result<ExtractorConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
    let cfg: ExtractorConfig = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?;

    if cfg.dpi < 72 {
        return Err(ConfigError::Invalid("dpi must be >= 72".into()));
    }
    if cfg.min_label_len < 2 {
        return Err(ConfigError::Invalid("min_label_len must be >= 2".into()));
    }
    if cfg.max_label_len < cfg.min_label_len {
        return Err(ConfigError::Invalid("max_label_len must be >= min_label_len".into()));
    }

    Ok(cfg)
}

/// One page of OCR output, split into lines. Page indices are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub index: usize,
    pub lines: Vec<String>,
}

impl PageText {
    pub fn from_raw(index: usize, raw: &str) -> Self {
        PageText { index, lines: raw.lines().map(|l| l.to_string()).collect() }
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    Colon,
    Underscore,
    Numbered,
    Checkbox,
    LabelStyle,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Colon => "colon",
            PatternKind::Underscore => "underscore",
            PatternKind::Numbered => "numbered",
            PatternKind::Checkbox => "checkbox",
            PatternKind::LabelStyle => "label_style",
        }
    }
}

/// A field-label match before normalization. Never mutated once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub text: String,
    pub kind: PatternKind,
    pub page: usize,
    pub line: usize,
}

// Label body: a letter first, then letters/digits/spaces and the punctuation
// ACORD labels actually carry (ampersand, slash, comma, parens, hyphen).
static COLON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z][A-Za-z0-9 &/',().-]*?)\s*:\s*$").unwrap());
static UNDERSCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z][A-Za-z0-9 &/',().-]*?)\s*_{3,}").unwrap());
static NUMBERED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+[.)]\s+([A-Za-z][A-Za-z0-9 &/',().-]*?)\s*:?\s*$").unwrap());
static LABEL_STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([A-Za-z][A-Za-z0-9 &/',().-]*?)\s*:\s*(\S.*)$").unwrap());
static CHECKBOX_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9 &/',().-]*)").unwrap());

const CHECKBOX_MAX_LABEL: usize = 40;
const LABEL_STYLE_MAX_WORDS: usize = 8;

fn within_bounds(label: &str, cfg: &ExtractorConfig) -> bool {
    let n = label.chars().count();
    n >= cfg.min_label_len && n <= cfg.max_label_len
}

fn match_colon(line: &str, cfg: &ExtractorConfig) -> Option<String> {
    let cap = COLON_RE.captures(line)?;
    let label = cap[1].trim_end().to_string();
    within_bounds(&label, cfg).then_some(label)
}

fn match_underscore(line: &str, cfg: &ExtractorConfig) -> Option<String> {
    let cap = UNDERSCORE_RE.captures(line)?;
    let label = cap[1].trim_end().to_string();
    within_bounds(&label, cfg).then_some(label)
}

fn match_numbered(line: &str, cfg: &ExtractorConfig) -> Option<String> {
    let cap = NUMBERED_RE.captures(line)?;
    let label = cap[1].trim_end().to_string();
    within_bounds(&label, cfg).then_some(label)
}

fn match_checkbox(line: &str, cfg: &ExtractorConfig) -> Option<String> {
    let t = line.trim_start();
    for glyph in &cfg.checkbox_glyphs {
        if let Some(rest) = t.strip_prefix(glyph.as_str()) {
            let rest = rest.trim_start();
            if let Some(cap) = CHECKBOX_LABEL_RE.captures(rest) {
                let label = cap[1].trim_end().to_string();
                let n = label.chars().count();
                // short labels only; a paragraph after a stray glyph is noise
                if n >= cfg.min_label_len && n <= CHECKBOX_MAX_LABEL {
                    return Some(label);
                }
            }
        }
    }
    None
}

fn match_label_style(line: &str, cfg: &ExtractorConfig) -> Option<String> {
    let cap = LABEL_STYLE_RE.captures(line)?;
    let label = cap[1].trim_end().to_string();
    let first_upper = label
        .chars()
        .find(|c| c.is_alphabetic())
        .map(|c| c.is_uppercase())
        .unwrap_or(false);
    if !first_upper || label.split_whitespace().count() > LABEL_STYLE_MAX_WORDS {
        return None;
    }
    within_bounds(&label, cfg).then_some(label)
}

/// Run all recognizer families over one page.
/// A line may match several families; every match is kept and overlap is
/// resolved later by the merge step. A non-matching line yields nothing.
pub fn recognize_page(page: &PageText, cfg: &ExtractorConfig) -> Vec<RawCandidate> {
    let mut out = Vec::new();
    for (li, raw) in page.lines.iter().enumerate() {
        let line = raw.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let families: [(PatternKind, Option<String>); 5] = [
            (PatternKind::Colon, match_colon(line, cfg)),
            (PatternKind::Underscore, match_underscore(line, cfg)),
            (PatternKind::Numbered, match_numbered(line, cfg)),
            (PatternKind::Checkbox, match_checkbox(line, cfg)),
            (PatternKind::LabelStyle, match_label_style(line, cfg)),
        ];
        for (kind, m) in families {
            if let Some(text) = m {
                out.push(RawCandidate { text, kind, page: page.index, line: li + 1 });
            }
        }
    }
    out
}

/// A candidate after canonicalization: `key` is the dedup identity,
/// `display` the presentation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub key: String,
    pub display: String,
}

const MIN_FIELD_LEN: usize = 2;

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut cs = w.chars();
            match cs.next() {
                Some(f) => f.to_uppercase().collect::<String>() + &cs.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonicalize a raw candidate's text. The key is case-folded and
/// whitespace-collapsed; the display form keeps the original casing unless
/// the raw text was shouted all-caps, which is title-cased instead.
/// Returns None for candidates too short to be fields.
pub fn normalize_candidate(raw: &str) -> Option<Normalized> {
    let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric());
    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() < MIN_FIELD_LEN {
        return None;
    }
    let key = collapsed.to_lowercase();
    let has_alpha = collapsed.chars().any(|c| c.is_alphabetic());
    let all_upper = has_alpha && !collapsed.chars().any(|c| c.is_lowercase());
    let display = if all_upper { title_case(&collapsed) } else { collapsed };
    Some(Normalized { key, display })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub page: usize,
    pub kind: PatternKind,
}

/// The deduplicated, display-ready field plus its occurrence history.
/// `display_name` is fixed at first sighting and never overwritten.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalField {
    pub key: String,
    pub display_name: String,
    pub occurrences: Vec<Occurrence>,
}

/// Accumulates candidates across pages while collecting. Sealing consumes
/// the set, after which no field can be inserted.
#[derive(Debug, Default)]
pub struct FieldSet {
    fields: HashMap<String, CanonicalField>,
}

impl FieldSet {
    pub fn new() -> Self {
        FieldSet::default()
    }

    /// Insert-or-append. First sighting of a key fixes the display name;
    /// later sightings only grow the occurrence list.
    pub fn merge(&mut self, norm: Normalized, occ: Occurrence) {
        match self.fields.entry(norm.key) {
            Entry::Occupied(mut e) => e.get_mut().occurrences.push(occ),
            Entry::Vacant(v) => {
                let key = v.key().clone();
                v.insert(CanonicalField {
                    key,
                    display_name: norm.display,
                    occurrences: vec![occ],
                });
            }
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn seal(self) -> SealedFields {
        SealedFields { fields: self.fields }
    }
}

/// Read-only field set; all pages processed.
#[derive(Debug)]
pub struct SealedFields {
    fields: HashMap<String, CanonicalField>,
}

impl SealedFields {
    pub fn get(&self, key: &str) -> Option<&CanonicalField> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Occurrence counts per recognizer family, for run metadata.
    pub fn kind_totals(&self) -> BTreeMap<&'static str, usize> {
        let mut totals = BTreeMap::new();
        for field in self.fields.values() {
            for occ in &field.occurrences {
                *totals.entry(occ.kind.as_str()).or_insert(0) += 1;
            }
        }
        totals
    }

    pub fn occurrence_total(&self) -> usize {
        self.fields.values().map(|f| f.occurrences.len()).sum()
    }

    /// Produce the final ordered list: case-insensitive sort, original
    /// casing as the tie-break, indices starting at 1.
    pub fn assemble(&self) -> FieldList {
        let mut names: Vec<&str> = self.fields.values().map(|f| f.display_name.as_str()).collect();
        names.sort_by(|a, b| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });
        FieldList {
            total: names.len(),
            entries: names
                .iter()
                .enumerate()
                .map(|(i, n)| FieldEntry { index: i + 1, name: n.to_string() })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldEntry {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldList {
    pub total: usize,
    pub entries: Vec<FieldEntry>,
}

fn page_candidates(page: &PageText, cfg: &ExtractorConfig) -> Vec<(Normalized, Occurrence)> {
    recognize_page(page, cfg)
        .into_iter()
        .filter_map(|c| {
            normalize_candidate(&c.text).map(|n| (n, Occurrence { page: c.page, kind: c.kind }))
        })
        .collect()
}

/// Recognize, normalize, and merge all pages sequentially.
pub fn extract_fields(pages: &[PageText], cfg: &ExtractorConfig) -> FieldSet {
    let mut set = FieldSet::new();
    for page in pages {
        for (norm, occ) in page_candidates(page, cfg) {
            set.merge(norm, occ);
        }
    }
    set
}

/// Parallel variant: pages are recognized on the rayon pool, then merged in
/// page order by a single consumer, so the result is identical to the
/// sequential scan (same keys, same display-name precedence).
pub fn extract_fields_parallel(pages: &[PageText], cfg: &ExtractorConfig) -> FieldSet {
    let per_page: Vec<Vec<(Normalized, Occurrence)>> =
        pages.par_iter().map(|p| page_candidates(p, cfg)).collect();
    let mut set = FieldSet::new();
    for cands in per_page {
        for (norm, occ) in cands {
            set.merge(norm, occ);
        }
    }
    set
}

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("DocumentUnreadable: {0}")]
    DocumentUnreadable(String),
    #[error("EngineUnavailable: missing {0}")]
    EngineUnavailable(String),
    #[error("OcrError: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
pub struct OcrRun {
    pub pages: Vec<PageText>,
    /// 1-based indices of pages whose render or OCR failed; they appear in
    /// `pages` as blank entries so later pages keep their positions.
    pub failed: Vec<usize>,
}

/// Rasterize each page with pdftoppm and OCR it with tesseract.
/// Page count comes from pdfinfo when available; otherwise pages are probed
/// until rendering fails. A page that fails to render or OCR becomes a blank
/// PageText; only document-level conditions abort.
pub fn ocr_document(path: &Path, cfg: &ExtractorConfig) -> Result<OcrRun, OcrError> {
    if !path.exists() {
        return Err(OcrError::DocumentUnreadable(format!(
            "{}: file not found",
            path.display()
        )));
    }
    for bin in ["pdftoppm", "tesseract"] {
        if which::which(bin).is_err() {
            return Err(OcrError::EngineUnavailable(bin.to_string()));
        }
    }

    let tmpdir = tempfile::tempdir().map_err(|e| OcrError::Other(e.to_string()))?;
    let page_count = probe_page_count(path)?;

    let mut pages = Vec::new();
    let mut failed = Vec::new();

    match page_count {
        Some(n) => {
            for i in 1..=n {
                match ocr_page(path, i, cfg, tmpdir.path()) {
                    Ok(text) => pages.push(PageText::from_raw(i, &text)),
                    Err(_) => {
                        failed.push(i);
                        pages.push(PageText { index: i, lines: Vec::new() });
                    }
                }
            }
        }
        None => {
            // No pdfinfo: probe forward until the renderer refuses a page.
            const MAX_PROBE_PAGES: usize = 2000;
            let mut i = 1;
            loop {
                match render_page(path, i, cfg.dpi, tmpdir.path()) {
                    Ok(img) => match run_tesseract(&img, cfg) {
                        Ok(text) => pages.push(PageText::from_raw(i, &text)),
                        Err(_) => {
                            failed.push(i);
                            pages.push(PageText { index: i, lines: Vec::new() });
                        }
                    },
                    Err(PageError::Encrypted) => {
                        return Err(OcrError::DocumentUnreadable(format!(
                            "{}: encrypted",
                            path.display()
                        )));
                    }
                    Err(PageError::Failed(_)) => break,
                }
                i += 1;
                if i > MAX_PROBE_PAGES {
                    break;
                }
            }
            if pages.is_empty() {
                return Err(OcrError::DocumentUnreadable(format!(
                    "{}: no page could be rasterized",
                    path.display()
                )));
            }
        }
    }

    Ok(OcrRun { pages, failed })
}

/// Page count via pdfinfo. Ok(None) when pdfinfo is absent or its output is
/// unusable; encryption is surfaced as DocumentUnreadable.
fn probe_page_count(path: &Path) -> Result<Option<usize>, OcrError> {
    if which::which("pdfinfo").is_err() {
        return Ok(None);
    }
    let out = Command::new("pdfinfo")
        .arg(path)
        .output()
        .map_err(|e| OcrError::Other(e.to_string()))?;
    if !out.status.success() {
        let err = String::from_utf8_lossy(&out.stderr).to_lowercase();
        if err.contains("encrypt") || err.contains("password") {
            return Err(OcrError::DocumentUnreadable(format!(
                "{}: encrypted",
                path.display()
            )));
        }
        return Ok(None);
    }
    let s = String::from_utf8_lossy(&out.stdout);
    let mut pages: Option<usize> = None;
    for line in s.lines() {
        if let Some(rest) = line.strip_prefix("Encrypted:") {
            if rest.trim().starts_with("yes") {
                return Err(OcrError::DocumentUnreadable(format!(
                    "{}: encrypted",
                    path.display()
                )));
            }
        }
        if let Some(rest) = line.strip_prefix("Pages:") {
            pages = rest.trim().parse::<usize>().ok();
        }
    }
    Ok(pages)
}

enum PageError {
    Encrypted,
    Failed(String),
}

fn render_page(path: &Path, page_no: usize, dpi: u32, workdir: &Path) -> Result<PathBuf, PageError> {
    let prefix = workdir.join(format!("p{}", page_no));
    let img = prefix.with_extension("png");
    let out = Command::new("pdftoppm")
        .arg("-r").arg(dpi.to_string())
        .arg("-f").arg(page_no.to_string())
        .arg("-l").arg(page_no.to_string())
        .arg("-gray")
        .arg("-png")
        .arg("-singlefile")
        .arg(path)
        .arg(&prefix)
        .output()
        .map_err(|e| PageError::Failed(e.to_string()))?;
    if !out.status.success() {
        let err = String::from_utf8_lossy(&out.stderr).to_lowercase();
        if err.contains("encrypt") || err.contains("password") {
            return Err(PageError::Encrypted);
        }
        return Err(PageError::Failed(format!("pdftoppm failed on page {}", page_no)));
    }
    if !img.exists() {
        return Err(PageError::Failed("image_missing".into()));
    }
    match std::fs::metadata(&img) {
        Ok(meta) if meta.len() > 0 => Ok(img),
        _ => Err(PageError::Failed("image_zero_size".into())),
    }
}

fn run_tesseract(img: &Path, cfg: &ExtractorConfig) -> Result<String, String> {
    let out = Command::new("tesseract")
        .arg(img)
        .arg("stdout")
        .arg("-l").arg(&cfg.lang)
        .arg("--psm").arg(cfg.psm.to_string())
        .arg("--oem").arg(cfg.oem.to_string())
        .output();
    match out {
        Ok(o) if o.status.success() => {
            let s = String::from_utf8_lossy(&o.stdout).to_string();
            if s.trim().is_empty() { Err("empty_text".into()) } else { Ok(s) }
        }
        Ok(o) => Err(format!("tesseract_exit_{}", o.status.code().unwrap_or(-1))),
        Err(e) => Err(format!("tesseract_spawn_error: {}", e)),
    }
}

fn ocr_page(path: &Path, page_no: usize, cfg: &ExtractorConfig, workdir: &Path) -> Result<String, String> {
    let img = render_page(path, page_no, cfg.dpi, workdir).map_err(|e| match e {
        PageError::Encrypted => "encrypted".to_string(),
        PageError::Failed(msg) => msg,
    })?;
    run_tesseract(&img, cfg)
}

/// Render the field report in the classic extractor format.
pub fn render_report(list: &FieldList, source_name: &str) -> String {
    let bar = "=".repeat(50);
    let mut out = String::new();
    out.push_str("ACORD Form Field Names\n");
    out.push_str(&bar);
    out.push('\n');
    out.push_str(&format!("Source: {}\n", source_name));
    out.push_str(&format!("Total Fields Found: {}\n", list.total));
    out.push_str(&bar);
    out.push_str("\n\n");
    for entry in &list.entries {
        out.push_str(&format!("{}. {}\n", entry.index, entry.name));
    }
    out
}

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("WriteFailed: {0}")]
    WriteFailed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitPaths {
    pub report_path: String,
    pub meta_path: String,
}

/// Atomically write the report and meta JSON into outdir with doc_id stem.
pub fn emit_report(
    list: &FieldList,
    source_name: &str,
    meta: &serde_json::Value,
    outdir: &str,
    doc_id: &str,
) -> Result<EmitPaths, EmitError> {
    std::fs::create_dir_all(outdir).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    let report_path = Path::new(outdir).join(format!("{}.txt", doc_id));
    let meta_path = Path::new(outdir).join(format!("{}.meta.json", doc_id));

    // Write temp files then rename
    let pid = std::process::id();
    let report_tmp = report_path.with_extension(format!("txt.tmp.{}", pid));
    let meta_tmp = meta_path.with_extension(format!("meta.json.tmp.{}", pid));

    let report = render_report(list, source_name);
    std::fs::write(&report_tmp, report).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    let meta_bytes = serde_json::to_vec_pretty(meta).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    std::fs::write(&meta_tmp, meta_bytes).map_err(|e| EmitError::WriteFailed(e.to_string()))?;

    std::fs::rename(&report_tmp, &report_path).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    std::fs::rename(&meta_tmp, &meta_path).map_err(|e| EmitError::WriteFailed(e.to_string()))?;

    Ok(EmitPaths {
        report_path: report_path.to_string_lossy().to_string(),
        meta_path: meta_path.to_string_lossy().to_string(),
    })
}

// Utility to compute sha256 hex
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    out.iter().map(|b| format!("{:02x}", b)).collect()
}
