//! Diesel schema for task workflow persistence.

diesel::table! {
    /// Task (reminder) records.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Task title.
        title -> Text,
        /// Optional free-form description.
        description -> Nullable<Text>,
        /// Optional due date.
        due_date -> Nullable<Timestamptz>,
        /// Priority label.
        #[max_length = 20]
        priority -> Varchar,
        /// Aggregate workflow status.
        #[max_length = 20]
        status -> Varchar,
        /// Rank within the status column.
        position -> Int8,
        /// Time of the latest status transition.
        last_status_change_at -> Timestamptz,
        /// Optional snooze deadline.
        snoozed_until -> Nullable<Timestamptz>,
        /// Whether the task recurs.
        is_recurring -> Bool,
        /// Recurrence rule text.
        recurrence_rule -> Nullable<Text>,
        /// Recurring task this instance was spawned from.
        parent_task_id -> Nullable<Uuid>,
        /// Source conversation channel.
        #[max_length = 255]
        channel -> Nullable<Varchar>,
        /// Creator identity.
        #[max_length = 320]
        created_by -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-assignee progress on a task.
    task_assignments (task_id, assignee) {
        /// Task the assignment belongs to.
        task_id -> Uuid,
        /// Assignee identity.
        #[max_length = 320]
        assignee -> Varchar,
        /// Assignee's own status.
        #[max_length = 20]
        status -> Varchar,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Registered users, owned by the authentication service.
    users (email) {
        /// Normalized e-mail identity.
        #[max_length = 320]
        email -> Varchar,
        /// Optional team name.
        #[max_length = 100]
        team -> Nullable<Varchar>,
        /// Whether the account is approved.
        approved -> Bool,
    }
}

diesel::joinable!(task_assignments -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, task_assignments, users);
