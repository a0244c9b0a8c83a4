pub mod corpus;
pub mod model;
pub mod poster;
pub mod recommender;
