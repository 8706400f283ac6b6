fn main() {
    solo::main();
}
