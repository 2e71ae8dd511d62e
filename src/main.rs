//! Word Memory native preview
//!
//! The extension itself runs from the wasm32 library build
//! (`start_content_script` / `start_popup`). Natively this binary highlights
//! saved words in a text file, which is handy for checking match behaviour:
//!
//! ```text
//! word-memory page.txt elephant river
//! ```

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: word-memory <text-file> [word...]");
        std::process::exit(2);
    };

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("cannot read {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let words: Vec<String> = args.collect();
    let rejected: Vec<&String> = words
        .iter()
        .filter(|w| word_memory::SavedWord::parse(w).is_none())
        .collect();
    for word in &rejected {
        log::warn!("Skipping {:?}: not a saveable word", word);
    }

    let store = word_memory::MemoryStore::with_words(words.iter().cloned());
    let mut memory = word_memory::WordMemory::new(
        word_memory::MemoryPage::from_paragraphs(&text),
        store.clone(),
        word_memory::Settings::default(),
    );
    let report = memory.load(store.snapshot());
    log::info!(
        "{} occurrences of {} words across {} text nodes",
        report.occurrences,
        memory.words().len(),
        report.nodes_rewritten
    );

    println!("{}", memory.tree().body_markup());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry points are start_content_script / start_popup in the library
}
