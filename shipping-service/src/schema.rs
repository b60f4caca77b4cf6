diesel::table! {
    shipments (id) {
        id -> Uuid,
        order_id -> Uuid,
        dispatched -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    shipment_items (shipment_id, product_id) {
        shipment_id -> Uuid,
        product_id -> Uuid,
        quantity -> Int4,
    }
}

diesel::table! {
    event_outbox (id) {
        id -> Int8,
        aggregateid -> Text,
        aggregatetype -> Text,
        payload -> Bytea,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(shipment_items -> shipments (shipment_id));

diesel::allow_tables_to_appear_in_same_query!(shipments, shipment_items, event_outbox);
