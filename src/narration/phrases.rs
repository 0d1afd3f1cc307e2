use rand::seq::SliceRandom;

use super::NarrationCategory;

const SESSION_START: &[&str] = &[
    "Okay, timer is running. Phone face down, now!",
    "I am watching you. Don't make me come over there.",
    "You said you would work, so work. No excuses today.",
    "Sit up straight and focus. This is your time, don't waste it.",
];

const BREAK_START: &[&str] = &[
    "Fine, take your break. Short one only!",
    "Go drink some water. Not the phone, water!",
    "Rest your eyes a little. Break is not a holiday.",
    "Good, you earned this break. Don't get comfortable.",
];

const BREAK_END: &[&str] = &[
    "Break is over. Back to the desk, now!",
    "Enough resting. Your work is not finishing itself.",
    "Time's up, back to work. Focus even harder this time.",
    "I hope you recharged, because now we work again.",
];

const FOCUS_REMINDER: &[&str] = &[
    "Are you still focusing? You better be.",
    "Put that phone down. I can see everything.",
    "Focus! Don't let me catch you slacking.",
    "Eyes on your work, not on the window.",
    "Still working? Good. Keep going, no scrolling.",
];

const SESSION_PAUSE: &[&str] = &[
    "Pausing already? Come back quickly.",
    "Okay, pause. But I am counting the minutes.",
    "Pause if you must. Don't disappear on me.",
];

const SESSION_QUIT: &[&str] = &[
    "Quitting? Hmm. We will talk about this later.",
    "Giving up so early? Next time you finish.",
    "Fine, stop. But tomorrow you try harder.",
];

const SESSION_END: &[&str] = &[
    "You actually finished! Very good, I'm proud of you.",
    "See? When you try hard, you can do it.",
    "Done! Now you may relax a little.",
    "Excellent work today. Same again tomorrow.",
];

/// Lines the strict parent picks from for each narration.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhraseBook;

impl PhraseBook {
    pub fn phrases(&self, category: NarrationCategory) -> &'static [&'static str] {
        match category {
            NarrationCategory::SessionStart => SESSION_START,
            NarrationCategory::BreakStart => BREAK_START,
            NarrationCategory::BreakEnd => BREAK_END,
            NarrationCategory::FocusReminder => FOCUS_REMINDER,
            NarrationCategory::SessionPause => SESSION_PAUSE,
            NarrationCategory::SessionQuit => SESSION_QUIT,
            NarrationCategory::SessionEnd => SESSION_END,
        }
    }

    pub fn pick(&self, category: NarrationCategory) -> &'static str {
        self.phrases(category)
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("Focus!")
    }
}
