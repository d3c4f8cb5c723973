pub mod episode_result;
