fn main() {
    runner_squad::game::run();
}
