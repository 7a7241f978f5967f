use buildable::{Buildable, Builder, BuilderError};

#[derive(Builder, Debug)]
struct Comment {
    content: String,
    #[builder(default = false)]
    is_top_answer: bool,
    #[builder(default = "ThumbsUp".to_string())]
    upvote_emoji: String,
    edited_by: Option<String>,
}

#[derive(Builder, Debug)]
struct Registration {
    username: String,
    email: String,
    #[builder(default)]
    newsletter: bool,
}

fn main() {
    println!("=== Basic Usage Example ===\n");

    // Only the required field
    let comment = Comment::build(|b| b.content("Nice answer".to_string()))
        .expect("Failed to build comment");
    println!("Created comment: {:?}", comment);

    // Defaults overridden, optional field set
    let comment = Comment::builder()
        .content("Accepted".to_string())
        .is_top_answer(true)
        .upvote_emoji("Rocket".to_string())
        .edited_by("moderator".to_string())
        .build()
        .expect("Failed to build comment");
    println!("\nCreated comment: {:?}", comment);

    // checked_build swallows the error
    let skipped = Comment::checked_build(|b| b.is_top_answer(true));
    println!("\nChecked build without content: {:?}", skipped);

    println!("\n=== Error Handling ===\n");
    match Registration::builder().username("dave".to_string()).build() {
        Ok(reg) => println!("Unexpectedly succeeded: {:?}", reg),
        Err(e) => println!("Expected error: {}", e),
    }

    match create_registration() {
        Ok(reg) => println!("\nCreated registration: {:?}", reg),
        Err(e) => println!("\nFailed: {}", e),
    }
}

fn create_registration() -> Result<Registration, BuilderError> {
    let reg = Registration::build(|b| {
        b.username("eve".to_string())
            .email("eve@example.com".to_string())
    })?;
    Ok(reg)
}
