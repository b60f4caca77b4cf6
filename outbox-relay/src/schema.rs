diesel::table! {
    event_outbox (id) {
        id -> Int8,
        aggregateid -> Text,
        aggregatetype -> Text,
        payload -> Bytea,
        created_at -> Timestamptz,
    }
}
