//! Vertical card display for judgment records.
//!
//! Renders one judgment as grouped, human-readable text: identity fields,
//! each section as numbered paragraphs, the party preamble, detected
//! verification blocks, and the stored summary with its citations resolved.

use judex_core::{Document, Paragraphs, PartySide, Preface, VerificationBlock};

const PREFACE_TITLE: &str = "前置";
const MAX_LIST_ITEMS: usize = 10;

// ── Public API ──

/// Print a single judgment as a vertical card.
pub fn print_judgment_card(doc: &Document, reasoning_marker: &str) {
    let title = doc.meta.title.as_deref().unwrap_or(doc.id());
    println!("=== {title} ===");
    println!("{}", doc.id());
    println!();

    print_identity(doc);

    for (section, text) in doc.display_sections() {
        println!("{section}");
        if section == PREFACE_TITLE {
            print_preface(&Preface::extract(&text));
        } else {
            let paragraphs = Paragraphs::from_text(&text);
            print_paragraphs(&paragraphs);
            if section.contains(reasoning_marker) {
                print_summary(doc, &paragraphs);
            }
        }
        println!();
    }

    if let Some(laws) = doc.extracted_laws.as_deref().filter(|l| !l.is_empty()) {
        println!("Cited Law ({})", laws.len());
        for law in laws.iter().take(MAX_LIST_ITEMS) {
            println!("  - {law}");
        }
        if laws.len() > MAX_LIST_ITEMS {
            println!("  ... and {} more", laws.len() - MAX_LIST_ITEMS);
        }
    }
}

/// Print summarised judgments with their headline point.
pub fn print_key_cases(cases: &[&Document]) {
    if cases.is_empty() {
        println!("No summarised judgments.");
        return;
    }
    for doc in cases {
        let court = doc
            .analysis_meta
            .court_normalized
            .as_deref()
            .or(doc.meta.court.as_deref())
            .unwrap_or("-");
        println!(
            "{}  {}  {}",
            doc.meta.date_iso.as_deref().unwrap_or("----------"),
            court,
            doc.meta.title.as_deref().unwrap_or(doc.id())
        );
        println!("    {}", doc.headline().unwrap_or("(no visible summary)"));
    }
}

// ── Section rendering ──

fn print_identity(doc: &Document) {
    let date = match (&doc.meta.date_minguo, &doc.meta.date_iso) {
        (Some(minguo), Some(iso)) => Some(format!("{minguo} ({iso})")),
        (Some(d), None) | (None, Some(d)) => Some(d.clone()),
        (None, None) => None,
    };
    let court = doc
        .analysis_meta
        .court_normalized
        .clone()
        .or_else(|| doc.meta.court.clone());
    let fields = [
        ("court", court),
        ("date", date),
        ("cause", doc.meta.cause.clone()),
        ("result", doc.decision_result.clone()),
        ("category", doc.analysis_meta.category_normalized.clone()),
        ("type", doc.analysis_meta.judgment_type_normalized.clone()),
        ("source_url", doc.meta.source_url.clone()),
    ];

    println!("Identity");
    for (label, value) in fields {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            println!("  {label:<12} {value}");
        }
    }
    if doc.has_summary() {
        println!("  {:<12} yes", "key case");
    }
    println!();
}

fn print_preface(preface: &Preface) {
    for party in &preface.parties {
        let marker = match party.side {
            PartySide::Initiating => "▶",
            PartySide::Responding => "◀",
            PartySide::Supporting => " ",
        };
        println!("  {marker} {:<8} {}", party.role, party.description);
    }
    for line in &preface.narrative {
        println!("    {}", line.trim());
    }
}

fn print_paragraphs(paragraphs: &Paragraphs) {
    for p in paragraphs.non_blank() {
        match VerificationBlock::extract(&p.content) {
            Some(block) => print_verification(&block),
            None => println!("  [{}] {}", p.position, p.content.trim()),
        }
    }
}

fn print_verification(block: &VerificationBlock) {
    println!("  ┌ verification");
    if let Some(issued) = block.issued_on() {
        match block.issue_date() {
            Some(date) => println!("  │ {:<10} {issued} ({date})", "issued"),
            None => println!("  │ {:<10} {issued}", "issued"),
        }
    }
    if let Some(org) = &block.organization {
        println!("  │ {:<10} {org}", "authority");
    }
    for person in &block.judges {
        println!("  │ {:<10} {}", person.role.label(), person.name);
    }
    for person in &block.clerks {
        println!("  │ {:<10} {}", person.role.label(), person.name);
    }
    if let Some(recorded) = block.recorded_on() {
        println!("  │ {:<10} {recorded}", "recorded");
    }
    if let Some(proof) = &block.proof {
        println!("  │ {proof}");
    }
    println!("  └");
}

fn print_summary(doc: &Document, paragraphs: &Paragraphs) {
    let entries: Vec<_> = doc.visible_summary().collect();
    if entries.is_empty() {
        return;
    }
    println!("  Summary");
    for (i, entry) in entries.iter().enumerate() {
        let mut cited: Vec<usize> = entry
            .resolve_refs(paragraphs)
            .iter()
            .map(|p| p.position)
            .collect();
        cited.dedup();
        if cited.is_empty() {
            println!("    {}. {}", i + 1, entry.point);
        } else {
            let refs: Vec<String> = cited.iter().map(usize::to_string).collect();
            println!("    {}. {} [ref: {}]", i + 1, entry.point, refs.join(", "));
        }
    }
}
