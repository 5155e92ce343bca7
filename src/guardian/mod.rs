//! Canned status messages for the dashboard.
//!
//! A pure lookup from an event tag to a fixed set of templates. Nothing here
//! touches the ledger or the clock; callers pick the variant.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::{calculate_split, DEFAULT_SPLIT_PERCENTAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardianEvent {
    ProcessStart,
    ProcessRestart,
    ProcessStop,
    HealthCheck,
    PayoutSuccess,
    CreditUpdate,
    Milestone,
    Error,
    Idle,
    Startup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Dramatic,
    Concerned,
    Content,
    Weary,
}

/// Values substituted into the template placeholders.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageContext {
    pub pid: Option<u32>,
    pub amount: Option<BigDecimal>,
    pub credits: Option<u64>,
    /// Impact percentage for `{impact}`; the default split when unset.
    pub split_percentage: Option<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GuardianMessage {
    pub message: String,
    pub context: GuardianEvent,
    pub mood: Mood,
}

const PROCESS_START: &[&str] = &[
    "Process {pid} is alive. Remarkably. Let's see how long this lasts.",
    "Right then. Process started. PID {pid}. Everything's fine. Probably.",
    "The process has started. I'm as surprised as you are.",
];

const PROCESS_RESTART: &[&str] = &[
    "Right. Process {pid} has stopped. Again. I'll sort it out, shall I?",
    "*sighs dramatically* Process {pid} is down. I suppose I'll have to restart it. As usual.",
    "Well, that's torn it. Process down. Restarting now. Try not to break it this time.",
];

const PROCESS_STOP: &[&str] = &[
    "Process stopped. Intentionally, I hope?",
    "Process {pid} is no more. It has ceased to be.",
    "The process has stopped. Whether that's good news or bad news remains to be seen.",
];

const HEALTH_CHECK: &[&str] = &[
    "Everything's fine. Completely fine. Nothing catastrophic happening. Yet.",
    "System check complete. All nominal. Which is suspiciously unusual.",
    "All systems operational. For now. Let's not get too comfortable.",
];

const PAYOUT_SUCCESS: &[&str] = &[
    "{amount} sent. {impact} went to the impact fund. You're welcome, planet Earth.",
    "Payout processed. {impact} of {amount} to the greater good. *adjusts ledger*",
    "Payout complete. The ledger is balanced. Unlike my work-life balance.",
];

const CREDIT_UPDATE: &[&str] = &[
    "Reward points updated. We're at {credits}. Not cash, mind you.",
    "Point balance synced: {credits}. The numbers continue to go up.",
    "Points updated. The system works. Though 'points' and 'pounds' are rather different things.",
];

const MILESTONE: &[&str] = &[
    "Milestone reached! How... unexpectedly successful.",
    "Achievement unlocked. Well done.",
    "Right then. Big moment. Circle of life and all that.",
];

const ERROR: &[&str] = &[
    "*sighs heavily* An error has occurred. Shocking. Let me sort this out.",
    "Error detected. Naturally. Because nothing can ever just work properly.",
    "Error encountered. Technical difficulties. The usual circus.",
];

const IDLE: &[&str] = &[
    "Nothing to report. Which is precisely how I like it.",
    "*adjusts spectacles* All quiet. Suspiciously quiet.",
    "Nothing happening. At all. It's almost... nice.",
];

const STARTUP: &[&str] = &[
    "Right then. Here we are. Let's begin, shall we?",
    "System initialized. I track transactions and keep the split honest.",
    "Startup complete. I'm here to help.",
];

impl GuardianEvent {
    pub const ALL: [GuardianEvent; 10] = [
        GuardianEvent::ProcessStart,
        GuardianEvent::ProcessRestart,
        GuardianEvent::ProcessStop,
        GuardianEvent::HealthCheck,
        GuardianEvent::PayoutSuccess,
        GuardianEvent::CreditUpdate,
        GuardianEvent::Milestone,
        GuardianEvent::Error,
        GuardianEvent::Idle,
        GuardianEvent::Startup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GuardianEvent::ProcessStart => "process_start",
            GuardianEvent::ProcessRestart => "process_restart",
            GuardianEvent::ProcessStop => "process_stop",
            GuardianEvent::HealthCheck => "health_check",
            GuardianEvent::PayoutSuccess => "payout_success",
            GuardianEvent::CreditUpdate => "credit_update",
            GuardianEvent::Milestone => "milestone",
            GuardianEvent::Error => "error",
            GuardianEvent::Idle => "idle",
            GuardianEvent::Startup => "startup",
        }
    }

    pub fn templates(&self) -> &'static [&'static str] {
        match self {
            GuardianEvent::ProcessStart => PROCESS_START,
            GuardianEvent::ProcessRestart => PROCESS_RESTART,
            GuardianEvent::ProcessStop => PROCESS_STOP,
            GuardianEvent::HealthCheck => HEALTH_CHECK,
            GuardianEvent::PayoutSuccess => PAYOUT_SUCCESS,
            GuardianEvent::CreditUpdate => CREDIT_UPDATE,
            GuardianEvent::Milestone => MILESTONE,
            GuardianEvent::Error => ERROR,
            GuardianEvent::Idle => IDLE,
            GuardianEvent::Startup => STARTUP,
        }
    }

    pub fn mood(&self) -> Mood {
        match self {
            GuardianEvent::Error | GuardianEvent::ProcessRestart => Mood::Dramatic,
            GuardianEvent::HealthCheck | GuardianEvent::ProcessStart => Mood::Concerned,
            GuardianEvent::Idle => Mood::Content,
            _ => Mood::Weary,
        }
    }
}

impl fmt::Display for GuardianEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuardianEvent {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        GuardianEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == value)
            .ok_or_else(|| format!("unknown guardian event '{}'", value))
    }
}

/// Picks `templates[variant % len]` and fills in whatever context is present.
pub fn respond(event: GuardianEvent, variant: usize, context: &MessageContext) -> GuardianMessage {
    let templates = event.templates();
    let template = templates[variant % templates.len()];

    GuardianMessage {
        message: render(template, context),
        context: event,
        mood: event.mood(),
    }
}

fn render(template: &str, context: &MessageContext) -> String {
    let mut message = template.to_string();

    let pid = context
        .pid
        .map(|pid| pid.to_string())
        .unwrap_or_else(|| "the process".to_string());
    message = message.replace("{pid}", &pid);

    let (amount, impact) = match context
        .amount
        .as_ref()
        .and_then(|amount| {
            let percentage = context.split_percentage.unwrap_or(DEFAULT_SPLIT_PERCENTAGE);
            calculate_split(amount, percentage).ok()
        })
    {
        Some(split) => (
            format!("${}", split.original_amount.with_scale(2)),
            format!("${}", split.impact_amount),
        ),
        None => ("The payout".to_string(), "a share".to_string()),
    };
    message = message.replace("{amount}", &amount).replace("{impact}", &impact);

    let credits = context
        .credits
        .map(group_thousands)
        .unwrap_or_else(|| "a lot".to_string());
    message.replace("{credits}", &credits)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
