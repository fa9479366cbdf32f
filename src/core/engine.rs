use crate::core::notifier::BirthdayNotifier;
use crate::domain::model::{Contact, ContactEvent, Persistence, PlannedGreeting, RunSummary};
use crate::domain::ports::{Clock, ContactStore, NotificationChannel};
use crate::utils::error::Result;
use chrono::NaiveDate;

/// Runs one pass of the pipeline: load, notify, persist if anything changed.
pub struct WisherEngine<S: ContactStore, N: NotificationChannel, C: Clock> {
    store: S,
    notifier: BirthdayNotifier<N>,
    clock: C,
}

impl<S: ContactStore, N: NotificationChannel, C: Clock> WisherEngine<S, N, C> {
    pub fn new(store: S, notifier: BirthdayNotifier<N>, clock: C) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &BirthdayNotifier<N> {
        &self.notifier
    }

    /// 讀取失敗時當作沒有聯絡人，不中斷執行
    async fn load_contacts(&self) -> (Vec<Contact>, Option<String>) {
        match self.store.load().await {
            Ok(contacts) => {
                tracing::debug!("Loaded {} contacts", contacts.len());
                (contacts, None)
            }
            Err(e) => {
                tracing::warn!("Could not load contacts, continuing with none: {}", e);
                tracing::warn!("💡 {}", e.recovery_suggestion());
                (Vec::new(), Some(e.to_string()))
            }
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let today = self.clock.today();
        tracing::info!("--- Birthday wisher running on {} ---", today);

        let (contacts, load_error) = self.load_contacts().await;
        let mut summary = RunSummary {
            date: today,
            contacts_loaded: contacts.len(),
            birthdays_found: false,
            notified: 0,
            already_notified: 0,
            failed: 0,
            skipped: 0,
            persistence: Persistence::NotNeeded,
            load_error,
        };

        if contacts.is_empty() {
            tracing::info!("No contacts found. Nothing to do.");
            return Ok(summary);
        }

        let outcome = self.notifier.run(contacts, today).await;

        summary.birthdays_found = outcome.found_birthday;
        summary.notified = outcome.count(|e| matches!(e, ContactEvent::Notified { .. }));
        summary.already_notified =
            outcome.count(|e| matches!(e, ContactEvent::AlreadyNotified { .. }));
        summary.failed = outcome.count(|e| matches!(e, ContactEvent::Failed { .. }));
        summary.skipped = outcome.count(|e| matches!(e, ContactEvent::Skipped { .. }));

        if outcome.updated {
            tracing::info!("Saving updated 'last_sent_year' data...");
            summary.persistence = match self.store.save(&outcome.contacts).await {
                Ok(()) => {
                    tracing::info!("Contacts saved");
                    Persistence::Saved
                }
                Err(e) => {
                    tracing::error!("❌ Could not save updated contacts: {}", e);
                    tracing::error!("💡 {}", e.recovery_suggestion());
                    Persistence::Failed(e.to_string())
                }
            };
        }

        tracing::info!("--- Birthday wisher finished ---");
        Ok(summary)
    }

    /// Today's greetings without sending or saving anything.
    pub async fn preview(&self) -> Result<(NaiveDate, Vec<PlannedGreeting>)> {
        let today = self.clock.today();
        let (contacts, _) = self.load_contacts().await;
        Ok((today, self.notifier.plan(&contacts, today)))
    }
}
