//! Plain-text rendering of each screen.

use std::fmt::Write as _;

use crate::models::{AnalysisResult, ChatMessage, Role};
use crate::shell::{Screen, Shell};
use crate::storage::KeyValueStorage;

const RULE: &str = "────────────────────────────────────────────────────────────";

/// Renders the screen the shell is currently on.
pub fn render<S: KeyValueStorage>(shell: &Shell<S>) -> String {
    let mut out = String::new();
    match shell.screen() {
        Screen::Login => render_login(&mut out, shell.error()),
        Screen::Upload => render_upload(&mut out, shell.error()),
        Screen::WelcomeBack => {
            let name = shell
                .session()
                .and_then(|s| s.display_name())
                .unwrap_or("bestie");
            render_welcome_back(&mut out, name);
        }
        Screen::Analyzing => {
            let _ = writeln!(out, "🔍 {}", shell.loading_message());
        }
        Screen::Dashboard => {
            out = render_dashboard_frame(shell);
            render_transcript(&mut out, &shell.chat_history(), shell.is_chat_loading());
        }
    }
    out
}

/// The dashboard down to the chat header, without any messages.
pub fn render_dashboard_frame<S: KeyValueStorage>(shell: &Shell<S>) -> String {
    let mut out = String::new();
    if let Some(analysis) = shell.analysis() {
        let user_name = shell
            .session()
            .and_then(|s| s.display_name())
            .or_else(|| analysis.display_name())
            .unwrap_or("Bestie");
        render_dashboard(&mut out, user_name, analysis);
    }
    let _ = writeln!(out, "\nCareer Concierge · Live");
    out
}

fn render_login(out: &mut String, error: Option<&str>) {
    let _ = writeln!(out, "Career Bestie AI 💅");
    let _ = writeln!(out, "Welcome Bestie");
    let _ = writeln!(
        out,
        "Login to unlock your main character energy and secure the bag. 💸✨"
    );
    let _ = writeln!(out, "  /login <google-id-token>");
    render_error(out, error);
}

fn render_upload(out: &mut String, error: Option<&str>) {
    let _ = writeln!(out, "Upgrade Your Career Rizz");
    let _ = writeln!(
        out,
        "Turn your PDF into a main character moment. Upload your resume and let's secure the bag together. 💸✨"
    );
    let _ = writeln!(out, "  /upload <path>   (PDF, PNG, or JPG • Max 10MB)");
    render_error(out, error);
}

fn render_welcome_back(out: &mut String, name: &str) {
    let _ = writeln!(out, "Welcome back, {name}! ✨");
    let _ = writeln!(
        out,
        "I remember you bestie! We have your resume on file. Want to pick up where we left off?"
    );
    let _ = writeln!(out, "  /use-existing   Use Existing Resume");
    let _ = writeln!(out, "  /upload-new     Upload New One");
}

fn render_error(out: &mut String, error: Option<&str>) {
    if let Some(error) = error {
        let _ = writeln!(out, "⚠ {error}");
    }
}

/// Everything on the dashboard except the chat transcript.
pub fn render_dashboard(out: &mut String, user_name: &str, analysis: &AnalysisResult) {
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "ResumeBestie · {user_name} (Main Character)");
    let _ = writeln!(out, "{RULE}");

    let _ = writeln!(out, "Predicted Role: {}", analysis.predicted_role);
    if !analysis.executive_summary.is_empty() {
        let _ = writeln!(out, "  {}", analysis.executive_summary);
    }
    if !analysis.experience_years.is_empty() {
        let _ = writeln!(out, "  Experience: {} years", analysis.experience_years);
    }

    let _ = writeln!(out, "\nGlow Up Tips");
    for imp in &analysis.improvements {
        let _ = writeln!(out, "  [{}] {}", imp.kind.label(), imp.suggestion);
    }

    let _ = writeln!(out, "\nExpertise Matrix");
    if !analysis.skills.is_empty() {
        let _ = writeln!(out, "  {}", analysis.skills.join(" · "));
    }

    let _ = writeln!(out, "\nThe Bag 💸");
    if analysis.jobs.is_empty() {
        let _ = writeln!(out, "  No jobs found yet!");
    }
    for job in &analysis.jobs {
        let _ = writeln!(
            out,
            "  {:>3}%  {} @ {}",
            job.match_percent(),
            job.title,
            job.company
        );
        if !job.salary_range.is_empty() {
            let _ = writeln!(out, "        {}", job.salary_range);
        }
        if !job.apply_link.is_empty() {
            let _ = writeln!(out, "        {}", job.apply_link);
        }
    }

    render_background(out, analysis);
}

fn render_background(out: &mut String, analysis: &AnalysisResult) {
    if !analysis.work_experience.is_empty() {
        let _ = writeln!(out, "\nExperience");
        for work in &analysis.work_experience {
            let _ = writeln!(out, "  {} · {} ({})", work.role, work.company, work.duration);
        }
    }
    if !analysis.education.is_empty() {
        let _ = writeln!(out, "\nEducation");
        for edu in &analysis.education {
            let _ = writeln!(out, "  {}, {} {}", edu.degree, edu.institution, edu.year);
        }
    }
    if !analysis.projects.is_empty() {
        let _ = writeln!(out, "\nProjects");
        for project in &analysis.projects {
            let _ = writeln!(out, "  {}: {}", project.name, project.description);
        }
    }
    if !analysis.certifications.is_empty() {
        let _ = writeln!(out, "\nCertifications");
        for cert in &analysis.certifications {
            match &cert.issuer {
                Some(issuer) => {
                    let _ = writeln!(out, "  {} ({issuer})", cert.name);
                }
                None => {
                    let _ = writeln!(out, "  {}", cert.name);
                }
            }
        }
    }
    if !analysis.achievements.is_empty() {
        let _ = writeln!(out, "\nAchievements");
        for achievement in &analysis.achievements {
            let _ = writeln!(out, "  • {achievement}");
        }
    }
}

pub fn render_transcript(out: &mut String, history: &[ChatMessage], loading: bool) {
    for msg in history {
        let _ = writeln!(out, "{}", format_message(msg));
    }
    if loading {
        let _ = writeln!(out, "✨ Bestie is cooking...");
    }
}

pub fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "you",
        Role::Assistant => "bestie",
    }
}

pub fn format_message(msg: &ChatMessage) -> String {
    format!("{}> {}", speaker(msg.role), msg.content)
}
