use crate::domain::model::{greeting, Contact, ContactEvent, NotifyOutcome, PlannedGreeting};
use crate::domain::ports::NotificationChannel;
use chrono::{Datelike, NaiveDate};
use std::time::Duration;

pub const DEFAULT_POST_SEND_DELAY: Duration = Duration::from_secs(15);

/// Matches today's birthdays and sends each contact at most one greeting per year.
pub struct BirthdayNotifier<N: NotificationChannel> {
    channel: N,
    post_send_delay: Duration,
}

enum Decision<'a> {
    NotToday,
    AlreadyNotified,
    Invalid(String),
    Send { name: &'a str, phone: &'a str },
}

fn required<'a>(field: &str, value: &'a Option<String>) -> std::result::Result<&'a str, String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        Some(_) => Err(format!("field '{}' is empty", field)),
        None => Err(format!("field '{}' is missing", field)),
    }
}

fn decide(contact: &Contact, today: NaiveDate) -> Decision<'_> {
    if !contact.has_birthday_on(today) {
        return Decision::NotToday;
    }
    if contact.notified_in(today.year()) {
        return Decision::AlreadyNotified;
    }
    // 無法判斷今年是否已寄過，寧可不寄
    if contact.is_mistyped("last_sent_year") {
        return Decision::Invalid("field 'last_sent_year' is not an integer year".to_string());
    }
    let checked = required("name", &contact.name)
        .and_then(|name| required("phone", &contact.phone).map(|phone| (name, phone)));
    match checked {
        Ok((name, phone)) => Decision::Send { name, phone },
        Err(reason) => Decision::Invalid(reason),
    }
}

impl<N: NotificationChannel> BirthdayNotifier<N> {
    pub fn new(channel: N) -> Self {
        Self {
            channel,
            post_send_delay: DEFAULT_POST_SEND_DELAY,
        }
    }

    pub fn with_post_send_delay(mut self, delay: Duration) -> Self {
        self.post_send_delay = delay;
        self
    }

    pub fn channel(&self) -> &N {
        &self.channel
    }

    /// Contacts that `run` would try to greet on `today`. No side effects.
    pub fn plan(&self, contacts: &[Contact], today: NaiveDate) -> Vec<PlannedGreeting> {
        contacts
            .iter()
            .enumerate()
            .filter_map(|(index, contact)| match decide(contact, today) {
                Decision::Send { name, phone } => Some(PlannedGreeting {
                    index,
                    name: name.to_string(),
                    phone: phone.to_string(),
                    message: greeting(name),
                }),
                _ => None,
            })
            .collect()
    }

    /// Walks the contacts in order and greets everyone due today.
    ///
    /// Only `last_sent_year` of successfully greeted contacts is changed.
    /// Delivery failures and unusable records are reported in
    /// [`NotifyOutcome::events`] and never stop the loop.
    pub async fn run(&self, mut contacts: Vec<Contact>, today: NaiveDate) -> NotifyOutcome {
        let year = today.year();
        let mut found_birthday = false;
        let mut updated = false;
        let mut events = Vec::new();

        tracing::info!("Checking for birthdays on: {}", today.format("%m-%d"));

        for (index, contact) in contacts.iter_mut().enumerate() {
            if let Some(raw) = contact.malformed_birthdate() {
                tracing::warn!(
                    "Ignoring contact #{} ({}): malformed birthdate {}, expected MM-DD",
                    index,
                    contact.label(),
                    raw
                );
            } else if contact.birthdate.is_none() {
                tracing::debug!("Ignoring contact #{} ({}): no birthdate", index, contact.label());
            }

            let (name, phone) = match decide(contact, today) {
                Decision::NotToday => continue,
                Decision::AlreadyNotified => {
                    found_birthday = true;
                    tracing::info!(
                        "Message already sent to {} this year. Skipping.",
                        contact.label()
                    );
                    events.push(ContactEvent::AlreadyNotified {
                        index,
                        name: contact.label().to_string(),
                    });
                    continue;
                }
                Decision::Invalid(reason) => {
                    found_birthday = true;
                    tracing::warn!(
                        "Birthday today for contact #{} but the record is unusable: {}",
                        index,
                        reason
                    );
                    events.push(ContactEvent::Skipped { index, reason });
                    continue;
                }
                Decision::Send { name, phone } => {
                    found_birthday = true;
                    (name.to_string(), phone.to_string())
                }
            };

            tracing::info!("Found birthday for {}! Sending message...", name);
            match self.channel.send(&phone, &greeting(&name)).await {
                Ok(()) => {
                    tracing::info!("Successfully sent message to {}.", name);
                    contact.mark_sent(year);
                    updated = true;
                    events.push(ContactEvent::Notified { index, name });

                    if !self.post_send_delay.is_zero() {
                        tracing::debug!("Waiting {:?} before the next contact", self.post_send_delay);
                        tokio::time::sleep(self.post_send_delay).await;
                    }
                }
                Err(e) => {
                    tracing::error!("Error sending message to {}: {}", name, e);
                    events.push(ContactEvent::Failed {
                        index,
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !found_birthday {
            tracing::info!("No birthdays found today.");
        }

        NotifyOutcome {
            found_birthday,
            updated,
            contacts,
            events,
        }
    }
}
