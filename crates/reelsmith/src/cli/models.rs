//! Model catalogue listing.

use reelsmith::{DEFAULT_MODEL_ID, available_models};

/// Print the model catalogue.
pub fn list_models() {
    println!("{:>3}  {:<20} {:<10} {:<7} KEY", "ID", "NAME", "PROVIDER", "KIND");
    for model in available_models() {
        let marker = if model.id == DEFAULT_MODEL_ID { "*" } else { " " };
        println!(
            "{:>3}{} {:<20} {:<10} {:<7} {}",
            model.id,
            marker,
            model.name,
            model.provider,
            model.kind.to_string(),
            if model.requires_key { "yes" } else { "no" }
        );
    }
    println!();
    println!("* default selection");
}
