use std::collections::HashSet;
use std::path::{Path, PathBuf};

use acord_field_extract::{
    check_deps, emit_report, enumerate_pdfs, extract_fields_parallel, install_help_for,
    load_config, ocr_document, sha256_hex, DepsResult, ExtractorConfig, OcrError,
};

fn usage() -> &'static str {
    "Usage: acord2fields <form.pdf | glob> [-o OUTPUT] [--dpi N] [--ocr-lang LANG] [--config FILE] [--dump-text]"
}

fn slugify(base: &str) -> String {
    let lower = base.to_lowercase();
    let mut s = String::with_capacity(lower.len());
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            s.push(ch);
        } else {
            s.push('-');
        }
    }
    let trimmed = s.trim_matches('-').to_string();
    let mut collapsed = String::with_capacity(trimmed.len());
    let mut prev_dash = false;
    for ch in trimmed.chars() {
        if ch == '-' {
            if !prev_dash {
                collapsed.push(ch);
            }
            prev_dash = true;
        } else {
            prev_dash = false;
            collapsed.push(ch);
        }
    }
    if collapsed.is_empty() {
        "form".to_string()
    } else {
        collapsed
    }
}

fn unique_slug(slug_in: String, used: &mut HashSet<String>) -> String {
    if !used.contains(&slug_in) {
        used.insert(slug_in.clone());
        return slug_in;
    }
    let mut i = 1;
    loop {
        let candidate = format!("{}-{}", slug_in, i);
        if !used.contains(&candidate) {
            used.insert(candidate.clone());
            return candidate;
        }
        i += 1;
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let dump_text = args.iter().any(|a| a == "--dump-text");
    let value_flags = ["-o", "--output", "--dpi", "--ocr-lang", "--config"];

    // positional input: first arg that is neither a flag nor a flag value
    let mut input: Option<String> = None;
    let mut skip_next = false;
    for a in &args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if value_flags.contains(&a.as_str()) {
            skip_next = true;
            continue;
        }
        if a.starts_with('-') {
            continue;
        }
        input = Some(a.clone());
        break;
    }
    let input = match input {
        Some(i) => i,
        None => {
            eprintln!("{}", usage());
            std::process::exit(1);
        }
    };

    let mut output: Option<String> = None;
    for flag in ["-o", "--output"] {
        if let Some(pos) = args.iter().position(|a| a == flag) {
            if let Some(val) = args.get(pos + 1) {
                if !val.starts_with("--") {
                    output = Some(val.clone());
                }
            }
        }
    }

    // 1) Config: optional YAML file, then CLI overrides
    let mut cfg = ExtractorConfig::default();
    if let Some(pos) = args.iter().position(|a| a == "--config") {
        if let Some(val) = args.get(pos + 1) {
            match load_config(Path::new(val)) {
                Ok(c) => cfg = c,
                Err(e) => {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "tool": "load_config",
                            "file": val,
                            "error": e.to_string(),
                            "error_code": 3
                        })
                    );
                    std::process::exit(3);
                }
            }
        }
    }
    if let Some(pos) = args.iter().position(|a| a == "--dpi") {
        if let Some(val) = args.get(pos + 1) {
            if let Ok(n) = val.parse::<u32>() {
                cfg.dpi = n.max(72);
            }
        }
    }
    if let Some(pos) = args.iter().position(|a| a == "--ocr-lang") {
        if let Some(val) = args.get(pos + 1) {
            if !val.starts_with("--") {
                cfg.lang = val.clone();
            }
        }
    }

    // 2) check_deps
    let deps: DepsResult = check_deps();
    if !deps.ok {
        eprintln!(
            "{}",
            serde_json::json!({
                "tool":"check_deps",
                "missing": deps.missing,
                "error_code": 2
            })
        );
        let help = install_help_for(&deps.missing);
        if !help.is_empty() {
            eprintln!("{}", help);
        }
        std::process::exit(2);
    } else {
        eprintln!(
            "{}",
            serde_json::json!({
                "tool":"check_deps",
                "status":"ok",
                "missing": deps.missing
            })
        );
    }

    // 3) Resolve inputs: glob patterns fan out, plain paths pass through
    let files: Vec<PathBuf> = if input.contains('*') || input.contains('?') {
        match enumerate_pdfs(&input) {
            Ok(files) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"enumerate_pdfs",
                        "count": files.len(),
                    })
                );
                files
            }
            Err(err) => {
                let guidance = match err {
                    acord_field_extract::EnumerateError::NoFilesFound { guidance } => guidance,
                };
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"enumerate_pdfs",
                        "error":"NoFilesFound",
                        "error_code":1
                    })
                );
                eprintln!("{}", guidance);
                std::process::exit(1);
            }
        }
    } else {
        vec![PathBuf::from(&input)]
    };

    let mut used_doc_ids: HashSet<String> = HashSet::new();

    for file in files {
        let started_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i128)
            .unwrap_or(0);
        let fname = file.file_name().and_then(|s| s.to_str()).unwrap_or("form.pdf").to_string();

        // Output stem: -o wins, otherwise the form's own name next to it
        let (outdir, base) = match &output {
            Some(o) => {
                let p = Path::new(o);
                let dir = p.parent().and_then(|d| d.to_str()).filter(|d| !d.is_empty()).unwrap_or(".");
                let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or("fields");
                (dir.to_string(), stem.to_string())
            }
            None => {
                let dir = file.parent().and_then(|d| d.to_str()).filter(|d| !d.is_empty()).unwrap_or(".");
                let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("form");
                (dir.to_string(), stem.to_string())
            }
        };
        let doc_id = unique_slug(slugify(&base), &mut used_doc_ids);

        // 4) Rasterize + OCR
        let run = match ocr_document(&file, &cfg) {
            Ok(run) => run,
            Err(err) => {
                let (code, label) = match &err {
                    OcrError::DocumentUnreadable(_) => (1, "DocumentUnreadable"),
                    OcrError::EngineUnavailable(_) => (2, "EngineUnavailable"),
                    OcrError::Other(_) => (1, "OcrError"),
                };
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"ocr_document",
                        "file": file,
                        "error": label,
                        "detail": err.to_string(),
                        "error_code": code
                    })
                );
                std::process::exit(code);
            }
        };
        eprintln!(
            "{}",
            serde_json::json!({
                "tool":"ocr_document",
                "file": file,
                "pages": run.pages.len(),
                "failed_pages": run.failed,
                "dpi": cfg.dpi,
                "lang": cfg.lang
            })
        );

        if dump_text {
            let artifacts_dir = format!("{}/{}-artifacts", outdir, doc_id);
            let _ = std::fs::create_dir_all(&artifacts_dir);
            for page in &run.pages {
                let page_path = format!("{}/page-{}.txt", artifacts_dir, page.index);
                if let Err(e) = std::fs::write(&page_path, page.lines.join("\n")) {
                    eprintln!(
                        "{}",
                        serde_json::json!({
                            "tool":"dump_text",
                            "file": page_path,
                            "error": e.to_string()
                        })
                    );
                }
            }
        }

        // 5) Recognize + normalize + merge, then seal
        let sealed = extract_fields_parallel(&run.pages, &cfg).seal();
        let kind_totals = sealed.kind_totals();
        let occurrence_total = sealed.occurrence_total();
        let list = sealed.assemble();
        eprintln!(
            "{}",
            serde_json::json!({
                "tool":"extract_fields",
                "file": file,
                "fields": list.total,
                "occurrences": occurrence_total,
                "kinds": kind_totals
            })
        );
        if list.total == 0 {
            eprintln!(
                "{}",
                serde_json::json!({
                    "tool":"extract_fields",
                    "file": file,
                    "notice":"NoFieldsFound"
                })
            );
        }

        // 6) Emit report + meta (atomic)
        let finished_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i128)
            .unwrap_or(0);
        let meta = serde_json::json!({
            "doc_id": doc_id,
            "source": fname,
            "engine": "tesseract",
            "page_count": run.pages.len(),
            "failed_pages": run.failed,
            "ocr": {
                "dpi": cfg.dpi,
                "lang": cfg.lang,
                "psm": cfg.psm,
                "oem": cfg.oem,
            },
            "fields": list.total,
            "occurrences": occurrence_total,
            "kinds": kind_totals,
            "timestamps": {"started_ms": started_ms, "finished_ms": finished_ms},
        });
        // Fingerprint over normalized meta (timestamps excluded)
        let mut meta_norm = meta.clone();
        if let Some(obj) = meta_norm.as_object_mut() {
            obj.remove("timestamps");
        }
        let meta_norm_bytes = serde_json::to_vec(&meta_norm).unwrap_or_default();
        let fingerprint = sha256_hex(&meta_norm_bytes);
        let mut meta_full = meta.as_object().cloned().unwrap_or_default();
        meta_full.insert("meta_fingerprint".to_string(), serde_json::json!(fingerprint));
        let meta = serde_json::Value::Object(meta_full);

        match emit_report(&list, &fname, &meta, &outdir, &doc_id) {
            Ok(paths) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"emit_report",
                        "file": file,
                        "report_path": paths.report_path,
                        "meta_path": paths.meta_path
                    })
                );
            }
            Err(e) => {
                eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool":"emit_report",
                        "file": file,
                        "error": e.to_string(),
                        "error_code": 6
                    })
                );
                std::process::exit(6);
            }
        }
    }
}
