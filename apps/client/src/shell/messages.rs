//! Fixed user-facing copy. Backend errors never reach the screen; one of
//! these is shown instead.

pub const BACKEND_DISCONNECTED: &str = "Backend disconnected. Saving disabled. ⚠️";
pub const LOGIN_FAILED: &str = "Login failed completely.";
pub const PROVIDER_LOGIN_FAILED: &str = "Vibe check failed! Google login didn't work. 🥺";
pub const ANALYSIS_FAILED: &str = "Analysis failed. Let's try that again, bestie! 🥺";
pub const CHAT_FAILED: &str = "Bestie, my brain glitched. Can we try that again? 🥺";
pub const WELCOME_BACK: &str =
    "Welcome back bestie! 💅✨ I've restored your analysis. Let's get that bag! 💸";

/// Flavor text for the analyzing screen; one is picked at random per upload.
pub const LOADING_VIBES: &[&str] = &[
    "AI is having a main-character moment with your resume ✨",
    "Stalking your resume (professionally) 👀",
    "Vibing with your experience…",
    "Reading your resume like tea ☕",
    "Putting your resume under the AI microscope 🔍",
    "Letting AI cook with your resume 🍳🔥",
    "Consulting the career gods 🧠",
    "Asking AI what your resume is giving…",
    "Resume check: loading vibes…",
    "Career glow-up in progress 💅",
    "Resume rizz incoming…",
    "Turning PDFs into possibilities 😤",
];

/// Greeting revealed after a fresh analysis lands.
pub fn analysis_welcome(name: Option<&str>, predicted_role: &str) -> String {
    format!(
        "HEYYY {}! 💅✨ Your resume is literally giving main character energy. \
         You were born for that {} life. I've already scouted the best opportunities \
         for you to secure the bag. 💸 Ready to dominate?",
        name.unwrap_or("BESTIE"),
        predicted_role
    )
}
