pub fn default_service_name() -> String {
    "receiptpayment".to_string()
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_amount_tolerance() -> f64 {
    0.000001
}
