//! `autofix classify`: offline preview of classification and dispatch.

use autofix::classifier::Classifier;
use autofix::fixes::StrategyKind;

pub fn cmd_classify(title: &str, body: &str) {
    let text = format!("{} {}", title, body);
    let category = Classifier::standard().classify_text(&text);
    println!(
        "category: {}",
        category.map(|c| c.as_str()).unwrap_or("unclassified")
    );
    println!("strategy: {}", StrategyKind::for_category(category));
}
