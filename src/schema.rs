table! {
    categories (id) {
        id -> Int4,
        title -> Varchar,
        slug -> Varchar,
        description -> Text,
        published -> Bool,
    }
}

table! {
    comments (id) {
        id -> Int4,
        post -> Int4,
        author -> Varchar,
        content -> Text,
        created -> Timestamp,
    }
}

table! {
    locations (id) {
        id -> Int4,
        name -> Varchar,
        published -> Bool,
    }
}

table! {
    posts (id) {
        id -> Int4,
        title -> Varchar,
        author -> Varchar,
        content -> Text,
        pub_date -> Timestamp,
        image -> Nullable<Varchar>,
        published -> Bool,
        category -> Nullable<Int4>,
        location -> Nullable<Int4>,
    }
}

table! {
    sessions (id) {
        id -> Varchar,
        user -> Varchar,
        expires -> Timestamp,
    }
}

table! {
    users (id) {
        id -> Varchar,
        hash -> Varchar,
        salt -> Bytea,
        name -> Varchar,
        email -> Varchar,
    }
}

joinable!(comments -> posts (post));
joinable!(comments -> users (author));
joinable!(posts -> categories (category));
joinable!(posts -> locations (location));
joinable!(posts -> users (author));
joinable!(sessions -> users (user));

allow_tables_to_appear_in_same_query!(categories, comments, locations, posts, sessions, users,);
