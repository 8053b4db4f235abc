use checkout_shared::Masked;

/// Opaque bearer credential issued by the processor's OAuth2 endpoint.
///
/// Expiry is owned by the processor; the provider that issued the token decides
/// whether it may be reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken(Masked<String>);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Masked(value.into()))
    }

    pub fn secret(&self) -> &str {
        self.0.expose()
    }
}
