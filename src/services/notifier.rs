// src/services/notifier.rs
/// Canal de notificação (usado apenas para links de reset de senha).
/// Fire-and-forget: falhas ficam no log, nunca chegam ao chamador.
pub trait Notifier: Send + Sync {
    fn deliver(&self, destination: &str, message: &str);
}

/// Implementação por omissão: escreve a mensagem no log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&self, destination: &str, message: &str) {
        tracing::info!(destination = %destination, "📧 Notificação: {}", message);
    }
}

/// Guarda as mensagens em memória para os testes poderem ler os links.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    sent: std::sync::Arc<std::sync::Mutex<Vec<(String, String)>>>,
}

#[cfg(test)]
impl MemoryNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[cfg(test)]
impl Notifier for MemoryNotifier {
    fn deliver(&self, destination: &str, message: &str) {
        match self.sent.lock() {
            Ok(mut sent) => sent.push((destination.to_string(), message.to_string())),
            Err(e) => tracing::warn!("MemoryNotifier: lock envenenado, mensagem descartada: {}", e),
        }
    }
}
