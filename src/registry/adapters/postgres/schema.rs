//! Diesel schema for the backend server and tool catalog.

diesel::table! {
    /// Registered backend servers.
    mcp_servers (id) {
        /// Internal server identifier.
        id -> Uuid,
        /// Unique server name.
        #[max_length = 100]
        name -> Varchar,
        /// Human description.
        description -> Text,
        /// Transport configuration as JSONB.
        transport -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Catalogued tools, unique per owning server.
    mcp_tools (id) {
        /// Internal tool identifier.
        id -> Uuid,
        /// Owning server identifier.
        server_id -> Uuid,
        /// Tool name as reported by the backend.
        name -> Text,
        /// Tool description.
        description -> Text,
        /// Opaque input schema.
        input_schema -> Jsonb,
        /// Whether the tool may be invoked.
        enabled -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(mcp_tools -> mcp_servers (server_id));
diesel::allow_tables_to_appear_in_same_query!(mcp_servers, mcp_tools);
