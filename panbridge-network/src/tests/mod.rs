mod bluetooth_tests;
mod command_tests;
mod dhcp_tests;
