pub mod actions;
pub mod animation;
pub mod carousel;
pub mod config;
pub mod error;
pub mod events;
pub mod markup;
pub mod schedule;
pub mod stage;
pub mod tasks {
    pub mod carousel;
}
