use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use inboxr::config::Config;
use inboxr::{Notification, NotificationStore, Subscription};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Normal,
    Input,
}

pub struct App {
    pub state: AppState,
    pub selected_index: usize,
    pub input_buffer: String,
    pub input_cursor: usize,
    pub input_prompt: String,
    pub status_message: String,
    pub show_help: bool,

    pub store: NotificationStore,
    // Latest list published by the store; written by the subscription.
    visible: Arc<Mutex<Arc<Vec<Notification>>>>,
    _subscription: Subscription,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let store = NotificationStore::with_ids(config.id_strategy.generator());

        let visible = Arc::new(Mutex::new(Arc::new(Vec::new())));
        let sink = Arc::clone(&visible);
        let subscription = store.subscribe(move |list| *sink.lock() = Arc::clone(list));

        if let Some(welcome) = &config.welcome_message {
            store.add_notification(welcome.clone());
        }
        if config.heartbeat_secs > 0 {
            spawn_heartbeat(store.clone(), Duration::from_secs(config.heartbeat_secs));
        }

        Ok(Self {
            state: AppState::Normal,
            selected_index: 0,
            input_buffer: String::new(),
            input_cursor: 0,
            input_prompt: String::new(),
            status_message: String::from("Welcome to inboxr! Press '?' for help"),
            show_help: false,
            store,
            visible,
            _subscription: subscription,
        })
    }

    pub fn notifications(&self) -> Arc<Vec<Notification>> {
        Arc::clone(&self.visible.lock())
    }

    pub fn next_item(&mut self) {
        let max = self.notifications().len();
        if max > 0 {
            self.selected_index = (self.selected_index + 1) % max;
        }
    }

    pub fn previous_item(&mut self) {
        let max = self.notifications().len();
        if max > 0 {
            self.selected_index = if self.selected_index == 0 {
                max - 1
            } else {
                self.selected_index - 1
            };
        }
    }

    pub fn go_home(&mut self) {
        self.selected_index = 0;
    }

    pub fn go_end(&mut self) {
        self.selected_index = self.notifications().len().saturating_sub(1);
    }

    pub fn new_item(&mut self) {
        self.state = AppState::Input;
        self.input_prompt = "Message: ".to_string();
        self.input_buffer.clear();
        self.input_cursor = 0;
    }

    pub fn mark_all_read(&mut self) {
        self.store.mark_all_read();
        self.status_message = "All notifications marked read".to_string();
        info!("marked all notifications read");
    }

    pub fn cancel_input(&mut self) {
        self.state = AppState::Normal;
        self.input_buffer.clear();
        self.input_cursor = 0;
    }

    pub fn submit_input(&mut self) {
        let input = self.input_buffer.clone();
        self.store.add_notification(input.clone());
        self.status_message = format!("Posted: {}", input);
        info!(len = input.len(), "notification posted");
        self.go_end();
        self.cancel_input();
    }

    pub fn input_char(&mut self, c: char) {
        self.input_buffer.insert(self.byte_cursor(), c);
        self.input_cursor += 1;
    }

    pub fn input_backspace(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            let at = self.byte_cursor();
            self.input_buffer.remove(at);
        }
    }

    pub fn input_move_left(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
        }
    }

    pub fn input_move_right(&mut self) {
        if self.input_cursor < self.input_buffer.chars().count() {
            self.input_cursor += 1;
        }
    }

    fn byte_cursor(&self) -> usize {
        self.input_buffer
            .char_indices()
            .nth(self.input_cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.input_buffer.len())
    }
}

fn spawn_heartbeat(store: NotificationStore, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        let mut beats: u64 = 0;
        loop {
            ticker.tick().await;
            beats += 1;
            store.add_notification(format!("Heartbeat #{}", beats));
        }
    });
}
