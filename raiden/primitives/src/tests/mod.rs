mod hashing;
