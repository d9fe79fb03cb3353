diesel::table! {
    gpu_temperatures (id) {
        id -> Integer,
        timestamp -> Text,
        temperature -> Integer,
    }
}
