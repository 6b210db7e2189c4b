//! End-of-match mail.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, instrument, warn};

use crate::config::SmtpConfig;
use crate::dispatch::{CollaboratorError, Notifier};
use crate::session::FinishedMatch;

/// Subject and body of the result mail.
#[instrument(skip(finished))]
pub fn compose(finished: &FinishedMatch) -> (String, String) {
    let result = finished.winner().summary();
    let subject = format!("Game: {result}");
    let body = format!(
        "Result: {result}\nDate: {}\nX: {}\nO: {}\nBoard:\n{}\n",
        finished.finished_at().format("%Y-%m-%d %H:%M:%S"),
        finished.player_x().name(),
        finished.player_o().name(),
        finished.board().display(),
    );
    (subject, body)
}

/// Sends the result over SMTP with STARTTLS.
#[derive(Debug)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpNotifier {
    /// Builds the transport from configuration. Does not connect yet.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the relay host or sender address is invalid.
    #[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
    pub fn from_config(config: &SmtpConfig) -> Result<Self, CollaboratorError> {
        let sender: Mailbox = config
            .sender()
            .parse()
            .map_err(|e| CollaboratorError::new(format!("Invalid sender address: {e}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(config.host())
            .map_err(|e| CollaboratorError::new(format!("Invalid SMTP relay: {e}")))?
            .port(*config.port())
            .credentials(Credentials::new(
                config.username().clone(),
                config.password().clone(),
            ))
            .build();

        info!("SMTP notifier configured");
        Ok(Self { transport, sender })
    }

    /// Builds the mail for one recipient.
    fn message_for(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<Message, CollaboratorError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| CollaboratorError::new(format!("Invalid address: {e}")))?;

        Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| CollaboratorError::new(format!("Failed to build mail: {e}")))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(skip(self, finished))]
    async fn notify(
        &self,
        finished: &FinishedMatch,
        recipients: &[String],
    ) -> Result<(), CollaboratorError> {
        let (subject, body) = compose(finished);
        let mut failed = 0usize;

        for recipient in recipients {
            let message = match self.message_for(recipient, &subject, &body) {
                Ok(message) => message,
                Err(e) => {
                    warn!(recipient = %recipient, error = %e, "Skipping recipient");
                    failed += 1;
                    continue;
                }
            };

            match self.transport.send(message).await {
                Ok(_) => debug!(recipient = %recipient, "Mail sent"),
                Err(e) => {
                    warn!(recipient = %recipient, error = %e, "Mail delivery failed");
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(CollaboratorError::new(format!(
                "{failed} of {} mails not delivered",
                recipients.len()
            )));
        }
        Ok(())
    }
}

/// Used when no SMTP relay is configured: records what would have been sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    #[instrument(skip(self, finished))]
    async fn notify(
        &self,
        finished: &FinishedMatch,
        recipients: &[String],
    ) -> Result<(), CollaboratorError> {
        let (subject, _body) = compose(finished);
        info!(?recipients, subject = %subject, "Mail delivery disabled, result not sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpConfig;
    use crate::session::Player;
    use noughts_game::{Board, Symbol, Winner};

    fn finished(winner: Winner) -> FinishedMatch {
        FinishedMatch::new(
            Board::new(),
            winner,
            Player::new("ann@example.com".into(), "Ann".into(), Symbol::X),
            Player::new("bob@example.com".into(), "Bob".into(), Symbol::O),
        )
    }

    #[test]
    fn test_compose_win() {
        let (subject, body) = compose(&finished(Winner::O));
        assert_eq!(subject, "Game: O won");
        assert!(body.starts_with("Result: O won\n"));
        assert!(body.contains("X: Ann\nO: Bob\n"));
    }

    #[test]
    fn test_compose_draw() {
        let (subject, _) = compose(&finished(Winner::Draw));
        assert_eq!(subject, "Game: Draw");
    }

    #[test]
    fn test_invalid_sender_rejected() {
        let config = SmtpConfig::new(
            "smtp.example.com".to_string(),
            587,
            "user".to_string(),
            "secret".to_string(),
            "not an address".to_string(),
        );
        assert!(SmtpNotifier::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_bad_recipient_does_not_stop_the_rest() {
        // Nothing listens on the discard port, so every real send fails too.
        let config = SmtpConfig::new(
            "localhost".to_string(),
            9,
            "user".to_string(),
            "secret".to_string(),
            "Noughts <noughts@example.com>".to_string(),
        );
        let notifier = SmtpNotifier::from_config(&config).unwrap();
        let recipients = vec!["not an address".to_string(), "bob@example.com".to_string()];

        let err = notifier
            .notify(&finished(Winner::X), &recipients)
            .await
            .unwrap_err();
        assert!(err.message.contains("2 of 2"), "got {}", err.message);
    }

    #[test]
    fn test_message_for_rejects_invalid_address() {
        let config = SmtpConfig::new(
            "localhost".to_string(),
            587,
            "user".to_string(),
            "secret".to_string(),
            "noughts@example.com".to_string(),
        );
        let notifier = SmtpNotifier::from_config(&config).unwrap();
        assert!(notifier.message_for("nope", "s", "b").is_err());
        assert!(notifier.message_for("ann@example.com", "s", "b").is_ok());
    }

    #[tokio::test]
    async fn test_log_notifier_succeeds() {
        let game = finished(Winner::X);
        assert!(LogNotifier.notify(&game, &game.recipients()).await.is_ok());
    }
}
