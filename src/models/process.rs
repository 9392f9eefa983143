use serde_json::{Map, Value};

crate::record! {
    /// A running or finished process instance.
    pub struct ProcessInstance {
        id: String,
        links: Vec<Value>,
        definition_id: String,
        definition_key: String,
        business_key: String,
        case_instance_id: String,
        ended: bool,
        suspended: bool,
        tenant_id: String,
    }
}

crate::record! {
    /// Result of starting a process instance.
    pub struct ProcessStartResult {
        process_instance_id: String,
        status: String,
        message: String,
    }
}

crate::record! {
    /// Result of cancelling a process instance.
    pub struct ProcessCancelResult {
        process_id: String,
        status: String,
        message: String,
    }
}

crate::payload! {
    /// Payload used to start a process instance.
    pub struct ProcessStartRequest {
        variables: Map<String, Value>,
        business_key: String,
        tenant_id: String,
    }
}
