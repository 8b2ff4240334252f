use sha2::{Digest, Sha512};

/// `hex(sha512(order_id + status_code + gross_amount + server_key))`, as the processor signs notifications.
pub fn notification_signature(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_notification(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str, signature: &str) -> bool {
    notification_signature(order_id, status_code, gross_amount, server_key).as_bytes() == signature.as_bytes()
}
