use chrono::{DateTime, Local};
use crate::api::{GenerateClient, GenerateReply};
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Assistant,
    Error,
}

/// One entry in the conversation log. Immutable once appended.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: u64,
    pub kind: MessageKind,
    pub content: String,
    /// Base64-encoded PNG attached to an assistant reply.
    pub image: Option<String>,
    /// Suggested next questions attached to an assistant reply.
    pub follow_ups: Vec<String>,
    pub created_at: DateTime<Local>,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Draft input
    pub draft: String,
    pub cursor: usize, // cursor position in draft, in chars

    // Conversation log
    pub messages: Vec<Message>,
    next_id: u64,

    // Request lifecycle: at most one outstanding request at a time
    pub loading: bool,
    pub request_task: Option<tokio::task::JoinHandle<anyhow::Result<GenerateReply>>>,

    // Chat viewport (inner sizes, updated during render)
    pub scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub total_chat_lines: u16,

    // Animation + transient footer status
    pub animation_frame: u8, // 0-2 for ellipsis animation
    pub status: Option<String>,

    // Service endpoint
    pub base_url: String,
    pub client: GenerateClient,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let base_url = config.resolve_base_url();
        let client = GenerateClient::new(&base_url);

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            draft: String::new(),
            cursor: 0,

            messages: Vec::new(),
            next_id: 1,

            loading: false,
            request_task: None,

            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            total_chat_lines: 0,

            animation_frame: 0,
            status: None,

            base_url,
            client,
        }
    }

    fn next_message_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Validate and accept the current draft for submission. Appends the
    /// user message, clears the draft, and raises the in-flight flag, then
    /// hands back the trimmed prompt for dispatch. Returns None (and leaves
    /// all state untouched) when the trimmed draft is empty or a request is
    /// already outstanding.
    pub fn begin_submit(&mut self) -> Option<String> {
        let prompt = self.draft.trim().to_string();
        if prompt.is_empty() || self.loading {
            return None;
        }

        let message = Message {
            id: self.next_message_id(),
            kind: MessageKind::User,
            content: prompt.clone(),
            image: None,
            follow_ups: Vec::new(),
            created_at: Local::now(),
        };
        self.messages.push(message);

        self.draft.clear();
        self.cursor = 0;
        self.loading = true;
        self.status = None;
        self.scroll_to_bottom();

        Some(prompt)
    }

    /// Submit a suggested follow-up question as if the user had typed it.
    /// No-op while a request is in flight. The draft is set and submitted
    /// in the same call so both sides see the identical string.
    pub fn follow_up(&mut self, question: &str) -> Option<String> {
        if self.loading {
            return None;
        }

        self.draft = question.to_string();
        self.cursor = self.draft.chars().count();
        self.begin_submit()
    }

    /// Record the outcome of the outstanding request: an assistant message
    /// on success, an error message on failure. Either way the in-flight
    /// flag drops and focus returns to the input field.
    pub fn finish_request(&mut self, outcome: anyhow::Result<GenerateReply>) {
        let message = match outcome {
            Ok(reply) => Message {
                id: self.next_message_id(),
                kind: MessageKind::Assistant,
                content: reply.response,
                image: reply.image,
                follow_ups: reply.followup.unwrap_or_default(),
                created_at: Local::now(),
            },
            Err(err) => Message {
                id: self.next_message_id(),
                kind: MessageKind::Error,
                content: format!("Failed to generate a reply: {err:#}"),
                image: None,
                follow_ups: Vec::new(),
                created_at: Local::now(),
            },
        };

        self.messages.push(message);
        self.loading = false;
        self.input_mode = InputMode::Editing;
        self.scroll_to_bottom();
    }

    /// Discard the whole conversation. No-op while the log is empty.
    pub fn clear_conversation(&mut self) {
        if self.messages.is_empty() {
            return;
        }
        self.messages.clear();
        self.scroll = 0;
        self.status = None;
    }

    /// The newest assistant message carrying follow-up suggestions; the
    /// number keys act on this one.
    pub fn latest_follow_ups(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.kind == MessageKind::Assistant && !m.follow_ups.is_empty())
    }

    /// The newest assistant message carrying an image payload.
    pub fn latest_image(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.kind == MessageKind::Assistant && m.image.is_some())
    }

    // Chat scrolling
    pub fn scroll_down(&mut self) {
        if self.scroll < self.total_chat_lines.saturating_sub(self.chat_height) {
            self.scroll = self.scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.chat_height / 2;
        let max_scroll = self.total_chat_lines.saturating_sub(self.chat_height);
        self.scroll = (self.scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.chat_height / 2;
        self.scroll = self.scroll.saturating_sub(half_page);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    /// Keep the newest message in view. Line counts are estimated with the
    /// same wrap width the renderer uses; the next frame stores the exact
    /// total in `total_chat_lines`.
    pub fn scroll_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in &self.messages {
            total_lines += 1; // role line
            for line in msg.content.lines() {
                // Character count, not byte length, for UTF-8 content
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            if msg.image.is_some() {
                total_lines += 1; // attachment row
            }
            if !msg.follow_ups.is_empty() {
                total_lines += 1 + msg.follow_ups.len() as u16; // header + rows
            }
            total_lines += 1; // blank line after message
        }

        if self.loading {
            total_lines += 2; // role line + thinking row
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.scroll = 0;
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn test_app() -> App {
        App::new(&Config::new())
    }

    fn reply(
        response: &str,
        image: Option<&str>,
        followup: Option<&[&str]>,
    ) -> GenerateReply {
        GenerateReply {
            response: response.to_string(),
            image: image.map(str::to_string),
            followup: followup.map(|f| f.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn submit_appends_user_message_and_clears_draft() {
        let mut app = test_app();
        app.draft = "  tell me a joke  ".to_string();

        let prompt = app.begin_submit();

        assert_eq!(prompt.as_deref(), Some("tell me a joke"));
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].kind, MessageKind::User);
        assert_eq!(app.messages[0].content, "tell me a joke");
        assert!(app.draft.is_empty());
        assert_eq!(app.cursor, 0);
        assert!(app.loading);
    }

    #[test]
    fn submit_rejects_empty_and_whitespace_drafts() {
        let mut app = test_app();

        assert!(app.begin_submit().is_none());

        app.draft = "   \t ".to_string();
        assert!(app.begin_submit().is_none());

        assert!(app.messages.is_empty());
        assert_eq!(app.draft, "   \t ");
        assert!(!app.loading);
    }

    #[test]
    fn submit_rejects_while_a_request_is_in_flight() {
        let mut app = test_app();
        app.draft = "first".to_string();
        app.begin_submit().unwrap();

        app.draft = "second".to_string();
        assert!(app.begin_submit().is_none());

        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.draft, "second");
    }

    #[test]
    fn successful_reply_appends_one_assistant_message() {
        let mut app = test_app();
        app.draft = "hi".to_string();
        app.begin_submit().unwrap();

        app.finish_request(Ok(reply("Hi", None, Some(&["A?", "B?"]))));

        assert_eq!(app.messages.len(), 2);
        let msg = &app.messages[1];
        assert_eq!(msg.kind, MessageKind::Assistant);
        assert_eq!(msg.content, "Hi");
        assert!(msg.image.is_none());
        assert_eq!(msg.follow_ups, vec!["A?".to_string(), "B?".to_string()]);
        assert!(!app.loading);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn absent_followups_become_an_empty_list() {
        let mut app = test_app();
        app.draft = "hi".to_string();
        app.begin_submit().unwrap();

        app.finish_request(Ok(reply("Hi", None, None)));

        assert!(app.messages[1].follow_ups.is_empty());
    }

    #[test]
    fn failed_request_appends_one_error_message() {
        let mut app = test_app();
        app.draft = "hi".to_string();
        app.begin_submit().unwrap();
        app.finish_request(Ok(reply("fine answer", None, None)));

        app.draft = "again".to_string();
        app.begin_submit().unwrap();
        app.finish_request(Err(anyhow!("connection refused")));

        assert_eq!(app.messages.len(), 4);
        let msg = &app.messages[3];
        assert_eq!(msg.kind, MessageKind::Error);
        assert!(!msg.content.is_empty());
        assert!(msg.content.contains("connection refused"));
        assert_ne!(msg.content, "fine answer");
        assert!(!app.loading);
    }

    #[test]
    fn follow_up_matches_a_manual_submission() {
        let mut manual = test_app();
        manual.draft = "What next?".to_string();
        let manual_prompt = manual.begin_submit();

        let mut shortcut = test_app();
        let shortcut_prompt = shortcut.follow_up("What next?");

        assert_eq!(manual_prompt, shortcut_prompt);
        assert_eq!(manual.messages.len(), shortcut.messages.len());
        assert_eq!(manual.messages[0].kind, shortcut.messages[0].kind);
        assert_eq!(manual.messages[0].content, shortcut.messages[0].content);
        assert!(shortcut.loading);
    }

    #[test]
    fn follow_up_is_a_noop_while_in_flight() {
        let mut app = test_app();
        app.draft = "first".to_string();
        app.begin_submit().unwrap();

        assert!(app.follow_up("What next?").is_none());
        assert_eq!(app.messages.len(), 1);
    }

    #[test]
    fn clear_empties_a_populated_log() {
        let mut app = test_app();
        app.draft = "hi".to_string();
        app.begin_submit().unwrap();
        app.finish_request(Ok(reply("Hi", None, None)));
        assert_eq!(app.messages.len(), 2);

        app.clear_conversation();
        assert!(app.messages.is_empty());
        assert_eq!(app.scroll, 0);
    }

    #[test]
    fn message_ids_are_unique_within_a_turn() {
        let mut app = test_app();
        app.draft = "hi".to_string();
        app.begin_submit().unwrap();
        app.finish_request(Ok(reply("Hi", None, None)));

        assert_ne!(app.messages[0].id, app.messages[1].id);
        assert!(app.messages[0].id < app.messages[1].id);
    }

    #[test]
    fn latest_follow_ups_picks_the_newest_suggestions() {
        let mut app = test_app();
        app.draft = "one".to_string();
        app.begin_submit().unwrap();
        app.finish_request(Ok(reply("old", None, Some(&["Old?"]))));

        app.draft = "two".to_string();
        app.begin_submit().unwrap();
        app.finish_request(Ok(reply("new", None, Some(&["New?"]))));

        let latest = app.latest_follow_ups().unwrap();
        assert_eq!(latest.follow_ups, vec!["New?".to_string()]);
    }
}
