use serde_json::{Map, Value};

crate::record! {
    /// Reference to a form attached to a task.
    pub struct FormRef {
        key: String,
        binding: String,
        version: i64,
    }
}

crate::record! {
    /// A user task.
    pub struct Task {
        id: String,
        name: String,
        assignee: String,
        owner: String,
        created: String,
        due: String,
        follow_up: String,
        last_updated: String,
        delegation_state: String,
        description: String,
        execution_id: String,
        parent_task_id: String,
        priority: i64,
        process_definition_id: String,
        process_instance_id: String,
        case_definition_id: String,
        case_execution_id: String,
        case_instance_id: String,
        task_definition_key: String,
        form_key: String,
        camunda_form_ref: FormRef,
        tenant_id: String,
        suspended: bool,
        task_state: String,
    }
}

crate::record! {
    /// Task count for a single candidate group.
    pub struct CountPerCandidateGroup {
        group_name: String,
        task_count: i64,
    }
}

crate::payload! {
    /// Query filters for task listing and counting.
    ///
    /// Covers the commonly used filters plus paging and sorting; `*_in` filters
    /// take comma-separated lists, as the engine expects.
    pub struct TaskQuery {
        task_id: String,
        task_id_in: String,
        process_instance_id: String,
        process_instance_business_key: String,
        process_definition_id: String,
        process_definition_key: String,
        process_definition_key_in: String,
        tenant_id_in: String,
        assignee: String,
        assignee_like: String,
        owner: String,
        candidate_group: String,
        candidate_user: String,
        assigned: bool,
        unassigned: bool,
        task_definition_key: String,
        name: String,
        name_like: String,
        priority: i64,
        due_before: String,
        due_after: String,
        created_before: String,
        created_after: String,
        active: bool,
        suspended: bool,
        first_result: i64,
        max_results: i64,
        sort_by: String,
        sort_order: String,
    }
}

crate::payload! {
    /// Payload used to complete a task.
    pub struct TaskCompletionRequest {
        variables: Map<String, Value>,
        with_variables_in_return: bool,
    }
}
