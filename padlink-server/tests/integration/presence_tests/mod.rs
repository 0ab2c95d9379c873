mod test_join_errors;
mod test_kick_member;
