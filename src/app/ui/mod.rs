mod controls;
mod details;
mod fps;
mod leaderboard;
mod panels;
