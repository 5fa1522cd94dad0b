/// Hands control back to the hosting UI once a registration completes.
pub trait NavigationPort: Send + Sync {
    fn navigate(&self, path: &str);
}
