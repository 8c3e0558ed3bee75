fn main() {
    vireo::start()
}
