use embedding_provider::config::default_sentence_config;
use embedding_provider::embedder::{Embedder, OnnxSentenceEmbedder};
use embedding_provider::similarity::cosine_similarity;

/// Embed one text, or two texts separated by `--` and print their cosine similarity.
fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (left, right) = match args.iter().position(|a| a == "--") {
        Some(split) => (args[..split].join(" "), Some(args[split + 1..].join(" "))),
        None => (args.join(" "), None),
    };
    let left = match left.trim() {
        "" => "sample text for embedding".to_string(),
        text => text.to_string(),
    };

    let config = default_sentence_config();
    println!("model: {}", config.model_path.display());
    let embedder = match OnnxSentenceEmbedder::new(config) {
        Ok(e) => e,
        Err(err) => {
            eprintln!("failed to initialize embedder: {err}");
            std::process::exit(1);
        }
    };

    let vector = match embedder.embed(&left) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("embedding failed: {err}");
            std::process::exit(1);
        }
    };
    let preview = &vector[..vector.len().min(8)];
    println!("{left:?}: {} dims, head {preview:?}", vector.len());

    let Some(right) = right.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) else {
        return;
    };
    match embedder.embed(&right) {
        Ok(other) => println!("cosine = {:.4}", cosine_similarity(&vector, &other)),
        Err(err) => {
            eprintln!("embedding failed: {err}");
            std::process::exit(1);
        }
    }
}
