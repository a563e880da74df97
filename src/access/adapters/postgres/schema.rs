//! Diesel schema for access-control persistence.

diesel::table! {
    /// Singleton server configuration; the key is always `1`.
    server_config (id) {
        /// Constant singleton key.
        id -> Int2,
        /// Deployment mode (`dev` or `prod`).
        #[max_length = 16]
        mode -> Varchar,
        /// Initialization timestamp.
        initialized_at -> Timestamptz,
    }
}

diesel::table! {
    /// Administrative users.
    admin_users (id) {
        /// User identifier.
        id -> Uuid,
        /// Unique username.
        #[max_length = 100]
        username -> Varchar,
        /// Role (`admin`).
        #[max_length = 32]
        role -> Varchar,
        /// Unique bearer token.
        access_token -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Scoped clients.
    mcp_clients (id) {
        /// Client identifier.
        id -> Uuid,
        /// Unique client name.
        #[max_length = 100]
        name -> Varchar,
        /// Human description.
        description -> Text,
        /// Unique bearer token.
        access_token -> Text,
        /// Allowed server names as a JSON array.
        allow_list -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}
