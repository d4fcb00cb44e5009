//! Generates a social pack and watches images arrive one by one.
//!
//! Run with: `cargo run --example social_pack -- "your idea"`
//!
//! Requires `GOOGLE_API_KEY` (or `API_KEY`).

use omnigen::{
    CredentialStore, GeminiImageProvider, GeminiTextProvider, GenerationSettings, Orchestrator,
    Tone,
};

#[tokio::main]
async fn main() -> omnigen::Result<()> {
    let idea = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Launching a new eco-friendly coffee cup line made from bamboo".into());

    let credentials = CredentialStore::from_env();
    if !credentials.has_selected_key() {
        eprintln!("{}", omnigen::MISSING_KEY_MESSAGE);
        std::process::exit(1);
    }

    let text = GeminiTextProvider::builder()
        .credentials(credentials.clone())
        .build()?;
    let images = GeminiImageProvider::builder()
        .credentials(credentials)
        .build()?;
    let orchestrator = Orchestrator::new(text, images)
        .with_settings(GenerationSettings::default().with_tone(Tone::Inspirational));

    let mut rx = orchestrator.subscribe();
    let watcher = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            let ready = state.posts.iter().filter(|p| !p.image_loading).count();
            println!("{}/{} images settled", ready, state.posts.len());
        }
    });

    let outcome = orchestrator.generate(&idea).await?;
    watcher.abort();

    for post in outcome.posts() {
        println!("\n== {} ({}) ==\n{}", post.platform, post.aspect_ratio, post.text_body);
        if post.image_failed() {
            println!("(image failed)");
        }
    }

    Ok(())
}
